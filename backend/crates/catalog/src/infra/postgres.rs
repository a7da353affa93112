//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::id::{MonedaId, TipoDocumentoId};
use sqlx::PgPool;

use crate::domain::entity::{Moneda, MonedaFields, TipoDocumento, TipoDocumentoFields};
use crate::domain::repository::{MonedaRepository, TipoDocumentoRepository};
use crate::domain::value_object::{CodigoDocumento, CodigoMoneda};
use crate::error::{CatalogError, CatalogResult};

const MONEDA_COLUMNS: &str =
    "id, codigo, nombre, simbolo, esta_activo, fecha_creacion, fecha_modificacion";

const TIPO_DOCUMENTO_COLUMNS: &str =
    "id, codigo, nombre, descripcion, es_default, esta_activo, fecha_creacion, fecha_modificacion";

/// PostgreSQL-backed repository for monedas and tipos de documento
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_moneda_violation(err: sqlx::Error, codigo: &CodigoMoneda) -> CatalogError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some("monedas_codigo_key") {
            return CatalogError::MonedaCodigoTaken(codigo.to_string());
        }
    }
    CatalogError::Database(err)
}

fn map_tipo_documento_violation(err: sqlx::Error, codigo: &CodigoDocumento) -> CatalogError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("tipos_documento_codigo_key") => {
                    return CatalogError::TipoDocumentoCodigoTaken(codigo.to_string());
                }
                // Lost a race with another request promoting a default.
                Some("tipos_documento_single_default_idx") => {
                    return CatalogError::DefaultTipoDocumento;
                }
                _ => {}
            }
        }
    }
    CatalogError::Database(err)
}

// ============================================================================
// Moneda Repository Implementation
// ============================================================================

impl MonedaRepository for PgCatalogRepository {
    async fn create(&self, fields: &MonedaFields, now: DateTime<Utc>) -> CatalogResult<Moneda> {
        let row = sqlx::query_as::<_, MonedaRow>(&format!(
            r#"
            INSERT INTO monedas (codigo, nombre, simbolo, esta_activo, fecha_creacion, fecha_modificacion)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {MONEDA_COLUMNS}
            "#
        ))
        .bind(fields.codigo.as_str())
        .bind(&fields.nombre)
        .bind(&fields.simbolo)
        .bind(fields.esta_activo)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_moneda_violation(e, &fields.codigo))?;

        Ok(row.into_moneda())
    }

    async fn find_by_id(&self, id: MonedaId) -> CatalogResult<Option<Moneda>> {
        let row = sqlx::query_as::<_, MonedaRow>(&format!(
            "SELECT {MONEDA_COLUMNS} FROM monedas WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MonedaRow::into_moneda))
    }

    async fn find_by_codigo(&self, codigo: &CodigoMoneda) -> CatalogResult<Option<Moneda>> {
        let row = sqlx::query_as::<_, MonedaRow>(&format!(
            "SELECT {MONEDA_COLUMNS} FROM monedas WHERE codigo = $1"
        ))
        .bind(codigo.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MonedaRow::into_moneda))
    }

    async fn list_active(&self) -> CatalogResult<Vec<Moneda>> {
        let rows = sqlx::query_as::<_, MonedaRow>(&format!(
            "SELECT {MONEDA_COLUMNS} FROM monedas WHERE esta_activo ORDER BY codigo"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MonedaRow::into_moneda).collect())
    }

    async fn update(&self, moneda: &Moneda, now: DateTime<Utc>) -> CatalogResult<Moneda> {
        let row = sqlx::query_as::<_, MonedaRow>(&format!(
            r#"
            UPDATE monedas SET
                codigo = $2,
                nombre = $3,
                simbolo = $4,
                esta_activo = $5,
                fecha_modificacion = $6
            WHERE id = $1
            RETURNING {MONEDA_COLUMNS}
            "#
        ))
        .bind(moneda.id.get())
        .bind(moneda.fields.codigo.as_str())
        .bind(&moneda.fields.nombre)
        .bind(&moneda.fields.simbolo)
        .bind(moneda.fields.esta_activo)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_moneda_violation(e, &moneda.fields.codigo))?;

        row.map(MonedaRow::into_moneda)
            .ok_or(CatalogError::MonedaNotFound)
    }

    async fn deactivate(&self, id: MonedaId, now: DateTime<Utc>) -> CatalogResult<bool> {
        let updated = sqlx::query(
            "UPDATE monedas SET esta_activo = FALSE, fecha_modificacion = $2 WHERE id = $1",
        )
        .bind(id.get())
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}

// ============================================================================
// Tipo de Documento Repository Implementation
// ============================================================================

impl TipoDocumentoRepository for PgCatalogRepository {
    async fn create(
        &self,
        fields: &TipoDocumentoFields,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        let mut tx = self.pool.begin().await?;

        if fields.es_default {
            clear_default(&mut tx, None, now).await?;
        }

        let row = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            r#"
            INSERT INTO tipos_documento (
                codigo,
                nombre,
                descripcion,
                es_default,
                esta_activo,
                fecha_creacion,
                fecha_modificacion
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {TIPO_DOCUMENTO_COLUMNS}
            "#
        ))
        .bind(fields.codigo.as_str())
        .bind(&fields.nombre)
        .bind(&fields.descripcion)
        .bind(fields.es_default)
        .bind(fields.esta_activo)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_tipo_documento_violation(e, &fields.codigo))?;

        tx.commit().await?;
        Ok(row.into_tipo_documento())
    }

    async fn find_by_id(&self, id: TipoDocumentoId) -> CatalogResult<Option<TipoDocumento>> {
        let row = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            "SELECT {TIPO_DOCUMENTO_COLUMNS} FROM tipos_documento WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TipoDocumentoRow::into_tipo_documento))
    }

    async fn find_by_codigo(
        &self,
        codigo: &CodigoDocumento,
    ) -> CatalogResult<Option<TipoDocumento>> {
        let row = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            "SELECT {TIPO_DOCUMENTO_COLUMNS} FROM tipos_documento WHERE codigo = $1"
        ))
        .bind(codigo.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TipoDocumentoRow::into_tipo_documento))
    }

    async fn find_default(&self) -> CatalogResult<Option<TipoDocumento>> {
        let row = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            "SELECT {TIPO_DOCUMENTO_COLUMNS} FROM tipos_documento WHERE es_default AND esta_activo"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TipoDocumentoRow::into_tipo_documento))
    }

    async fn list_active(&self) -> CatalogResult<Vec<TipoDocumento>> {
        let rows = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            "SELECT {TIPO_DOCUMENTO_COLUMNS} FROM tipos_documento WHERE esta_activo ORDER BY codigo"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(TipoDocumentoRow::into_tipo_documento)
            .collect())
    }

    async fn update(
        &self,
        tipo: &TipoDocumento,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        let mut tx = self.pool.begin().await?;

        if tipo.fields.es_default {
            clear_default(&mut tx, Some(tipo.id), now).await?;
        }

        let row = sqlx::query_as::<_, TipoDocumentoRow>(&format!(
            r#"
            UPDATE tipos_documento SET
                codigo = $2,
                nombre = $3,
                descripcion = $4,
                es_default = $5,
                esta_activo = $6,
                fecha_modificacion = $7
            WHERE id = $1
            RETURNING {TIPO_DOCUMENTO_COLUMNS}
            "#
        ))
        .bind(tipo.id.get())
        .bind(tipo.fields.codigo.as_str())
        .bind(&tipo.fields.nombre)
        .bind(&tipo.fields.descripcion)
        .bind(tipo.fields.es_default)
        .bind(tipo.fields.esta_activo)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_tipo_documento_violation(e, &tipo.fields.codigo))?;

        let Some(row) = row else {
            return Err(CatalogError::TipoDocumentoNotFound);
        };
        tx.commit().await?;
        Ok(row.into_tipo_documento())
    }

    async fn deactivate(&self, id: TipoDocumentoId, now: DateTime<Utc>) -> CatalogResult<bool> {
        // Never deactivates the default.
        let updated = sqlx::query(
            r#"
            UPDATE tipos_documento SET esta_activo = FALSE, fecha_modificacion = $2
            WHERE id = $1 AND NOT es_default
            "#,
        )
        .bind(id.get())
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}

async fn clear_default(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    keep: Option<TipoDocumentoId>,
    now: DateTime<Utc>,
) -> CatalogResult<()> {
    sqlx::query(
        r#"
        UPDATE tipos_documento SET es_default = FALSE, fecha_modificacion = $2
        WHERE es_default AND ($1::BIGINT IS NULL OR id <> $1)
        "#,
    )
    .bind(keep.map(|id| id.get()))
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct MonedaRow {
    id: i64,
    codigo: String,
    nombre: String,
    simbolo: String,
    esta_activo: bool,
    fecha_creacion: DateTime<Utc>,
    fecha_modificacion: DateTime<Utc>,
}

impl MonedaRow {
    fn into_moneda(self) -> Moneda {
        Moneda {
            id: MonedaId::new(self.id),
            fields: MonedaFields {
                codigo: CodigoMoneda::from_db(self.codigo),
                nombre: self.nombre,
                simbolo: self.simbolo,
                esta_activo: self.esta_activo,
            },
            fecha_creacion: self.fecha_creacion,
            fecha_modificacion: self.fecha_modificacion,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TipoDocumentoRow {
    id: i64,
    codigo: String,
    nombre: String,
    descripcion: Option<String>,
    es_default: bool,
    esta_activo: bool,
    fecha_creacion: DateTime<Utc>,
    fecha_modificacion: DateTime<Utc>,
}

impl TipoDocumentoRow {
    fn into_tipo_documento(self) -> TipoDocumento {
        TipoDocumento {
            id: TipoDocumentoId::new(self.id),
            fields: TipoDocumentoFields {
                codigo: CodigoDocumento::from_db(self.codigo),
                nombre: self.nombre,
                descripcion: self.descripcion,
                es_default: self.es_default,
                esta_activo: self.esta_activo,
            },
            fecha_creacion: self.fecha_creacion,
            fecha_modificacion: self.fecha_modificacion,
        }
    }
}
