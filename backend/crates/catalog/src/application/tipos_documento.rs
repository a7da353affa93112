//! Tipo de Documento Use Cases

use std::sync::Arc;

use accounts::models::Usuario;
use chrono::{DateTime, Utc};
use kernel::id::TipoDocumentoId;

use crate::application::require;
use crate::domain::entity::{TipoDocumento, TipoDocumentoFields};
use crate::domain::repository::TipoDocumentoRepository;
use crate::domain::value_object::CodigoDocumento;
use crate::error::{CatalogError, CatalogResult};

pub const TIPOS_DOCUMENTO_WRITE: &str = "tipos_documento:write";

pub struct CreateTipoDocumentoInput {
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub es_default: bool,
}

#[derive(Default)]
pub struct UpdateTipoDocumentoInput {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    /// `Some(None)` clears the description
    pub descripcion: Option<Option<String>>,
    pub es_default: Option<bool>,
    pub esta_activo: Option<bool>,
}

pub struct QueryTiposDocumentoUseCase<R>
where
    R: TipoDocumentoRepository,
{
    repo: Arc<R>,
}

impl<R> QueryTiposDocumentoUseCase<R>
where
    R: TipoDocumentoRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: TipoDocumentoId) -> CatalogResult<TipoDocumento> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::TipoDocumentoNotFound)
    }

    pub async fn get_by_codigo(&self, codigo: &str) -> CatalogResult<TipoDocumento> {
        let codigo =
            CodigoDocumento::new(codigo).map_err(|_| CatalogError::TipoDocumentoNotFound)?;
        self.repo
            .find_by_codigo(&codigo)
            .await?
            .ok_or(CatalogError::TipoDocumentoNotFound)
    }

    pub async fn get_default(&self) -> CatalogResult<TipoDocumento> {
        self.repo
            .find_default()
            .await?
            .ok_or(CatalogError::TipoDocumentoNotFound)
    }

    pub async fn list(&self) -> CatalogResult<Vec<TipoDocumento>> {
        self.repo.list_active().await
    }
}

pub struct ManageTiposDocumentoUseCase<R>
where
    R: TipoDocumentoRepository,
{
    repo: Arc<R>,
}

impl<R> ManageTiposDocumentoUseCase<R>
where
    R: TipoDocumentoRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        actor: &Usuario,
        input: CreateTipoDocumentoInput,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        require(actor, TIPOS_DOCUMENTO_WRITE)?;

        let fields = TipoDocumentoFields::new(
            CodigoDocumento::new(input.codigo)?,
            input.nombre,
            input.descripcion,
            input.es_default,
        )?;
        if self.repo.find_by_codigo(&fields.codigo).await?.is_some() {
            return Err(CatalogError::TipoDocumentoCodigoTaken(fields.codigo.to_string()));
        }

        let tipo = self.repo.create(&fields, now).await?;
        tracing::info!(
            tipo_documento_id = %tipo.id,
            codigo = %tipo.fields.codigo,
            es_default = tipo.fields.es_default,
            "Tipo de documento created"
        );
        Ok(tipo)
    }

    pub async fn update(
        &self,
        actor: &Usuario,
        id: TipoDocumentoId,
        input: UpdateTipoDocumentoInput,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        require(actor, TIPOS_DOCUMENTO_WRITE)?;

        let mut tipo = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::TipoDocumentoNotFound)?;

        if let Some(codigo) = input.codigo {
            let codigo = CodigoDocumento::new(codigo)?;
            if codigo != tipo.fields.codigo {
                if let Some(other) = self.repo.find_by_codigo(&codigo).await? {
                    if other.id != id {
                        return Err(CatalogError::TipoDocumentoCodigoTaken(codigo.to_string()));
                    }
                }
            }
            tipo.fields.codigo = codigo;
        }
        if let Some(nombre) = input.nombre {
            tipo.fields.nombre = nombre.trim().to_string();
        }
        if let Some(descripcion) = input.descripcion {
            tipo.fields.descripcion = descripcion
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
        }
        if let Some(es_default) = input.es_default {
            tipo.fields.es_default = es_default;
        }
        if let Some(esta_activo) = input.esta_activo {
            tipo.fields.esta_activo = esta_activo;
        }
        tipo.fields.validate()?;

        let updated = self.repo.update(&tipo, now).await?;
        tracing::info!(tipo_documento_id = %id, "Tipo de documento updated");
        Ok(updated)
    }

    /// Soft delete. The default tipo de documento is refused.
    pub async fn delete(
        &self,
        actor: &Usuario,
        id: TipoDocumentoId,
        now: DateTime<Utc>,
    ) -> CatalogResult<()> {
        require(actor, TIPOS_DOCUMENTO_WRITE)?;

        let tipo = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::TipoDocumentoNotFound)?;
        if tipo.fields.es_default {
            return Err(CatalogError::DefaultTipoDocumento);
        }

        // `false` here means it was promoted to default in the meantime.
        if !self.repo.deactivate(id, now).await? {
            return Err(CatalogError::DefaultTipoDocumento);
        }
        tracing::info!(tipo_documento_id = %id, "Tipo de documento deactivated");
        Ok(())
    }
}
