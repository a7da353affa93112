//! PostgreSQL Repository Implementation
//!
//! Profile, password hash and lockout counters share the `usuarios` row.

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::{Credential, LockoutState, ProfileFields, Usuario, UsuarioProfile};
use crate::domain::repository::{CredentialRepository, UsuarioRepository};
use crate::domain::services::LockStatus;
use crate::domain::value_object::{Email, Role, Username};
use crate::error::{AccountsError, AccountsResult};

const USUARIO_COLUMNS: &str = r#"
    id,
    nombre,
    apellido,
    email,
    username,
    is_active,
    is_superuser,
    role,
    corredor_numero,
    comision_porcentaje,
    telefono,
    fecha_creacion,
    fecha_modificacion
"#;

/// PostgreSQL-backed usuario and credential repository
#[derive(Clone)]
pub struct PgAccountsRepository {
    pool: PgPool,
}

impl PgAccountsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate unique-constraint violations into domain errors.
fn map_unique_violation(err: sqlx::Error) -> AccountsError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("usuarios_email_key") => return AccountsError::EmailTaken,
                Some("usuarios_username_lower_idx") => return AccountsError::UsernameTaken,
                _ => {}
            }
        }
    }
    AccountsError::Database(err)
}

// ============================================================================
// Usuario Repository Implementation
// ============================================================================

impl UsuarioRepository for PgAccountsRepository {
    async fn create(
        &self,
        profile: &UsuarioProfile,
        password_hash: &HashedPassword,
        now: DateTime<Utc>,
    ) -> AccountsResult<Usuario> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!(
            r#"
            INSERT INTO usuarios (
                nombre,
                apellido,
                email,
                username,
                hashed_password,
                is_active,
                is_superuser,
                role,
                corredor_numero,
                comision_porcentaje,
                telefono,
                fecha_creacion,
                fecha_modificacion
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(&profile.nombre)
        .bind(&profile.apellido)
        .bind(profile.email.as_str())
        .bind(profile.username.as_str())
        .bind(password_hash.as_str())
        .bind(profile.is_enabled)
        .bind(profile.is_superuser)
        .bind(profile.role().code())
        .bind(profile.corredor_numero())
        .bind(profile.comision_porcentaje())
        .bind(&profile.telefono)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.into_usuario()
    }

    async fn find_by_id(&self, id: UsuarioId) -> AccountsResult<Option<Usuario>> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UsuarioRow::into_usuario).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> AccountsResult<Option<Usuario>> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE lower(username) = $1"
        ))
        .bind(username.canonical())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UsuarioRow::into_usuario).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Usuario>> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UsuarioRow::into_usuario).transpose()
    }

    async fn list(&self, skip: i64, limit: i64) -> AccountsResult<Vec<Usuario>> {
        let rows = sqlx::query_as::<_, UsuarioRow>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UsuarioRow::into_usuario).collect()
    }

    async fn list_by_corredor(&self, corredor_numero: i64) -> AccountsResult<Vec<Usuario>> {
        let rows = sqlx::query_as::<_, UsuarioRow>(&format!(
            "SELECT {USUARIO_COLUMNS} FROM usuarios WHERE corredor_numero = $1 ORDER BY id"
        ))
        .bind(corredor_numero)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UsuarioRow::into_usuario).collect()
    }

    async fn update(&self, usuario: &Usuario, now: DateTime<Utc>) -> AccountsResult<Usuario> {
        let profile = &usuario.profile;
        let row = sqlx::query_as::<_, UsuarioRow>(&format!(
            r#"
            UPDATE usuarios SET
                nombre = $2,
                apellido = $3,
                email = $4,
                username = $5,
                is_active = $6,
                is_superuser = $7,
                role = $8,
                corredor_numero = $9,
                comision_porcentaje = $10,
                telefono = $11,
                fecha_modificacion = $12
            WHERE id = $1
            RETURNING {USUARIO_COLUMNS}
            "#
        ))
        .bind(usuario.id.get())
        .bind(&profile.nombre)
        .bind(&profile.apellido)
        .bind(profile.email.as_str())
        .bind(profile.username.as_str())
        .bind(profile.is_enabled)
        .bind(profile.is_superuser)
        .bind(profile.role().code())
        .bind(profile.corredor_numero())
        .bind(profile.comision_porcentaje())
        .bind(&profile.telefono)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.ok_or(AccountsError::UsuarioNotFound)?.into_usuario()
    }

    async fn delete(&self, id: UsuarioId) -> AccountsResult<bool> {
        let deleted = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn count(&self) -> AccountsResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM usuarios")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAccountsRepository {
    async fn find_credential(&self, id: UsuarioId) -> AccountsResult<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT
                id,
                hashed_password,
                intentos_fallidos,
                bloqueado_hasta,
                ultimo_intento_fallido
            FROM usuarios
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CredentialRow::into_credential))
    }

    async fn update_lockout<F, T>(&self, id: UsuarioId, apply: F) -> AccountsResult<Option<T>>
    where
        F: FnOnce(&mut LockoutState) -> T + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent attempts on the same usuario queue here, so
        // no failed attempt is lost.
        let row = sqlx::query_as::<_, LockoutRow>(
            r#"
            SELECT intentos_fallidos, bloqueado_hasta, ultimo_intento_fallido
            FROM usuarios
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let before = row.into_state();
        let mut state = before;
        let output = apply(&mut state);

        if state != before {
            write_lockout(&mut tx, id, &state).await?;
        }
        tx.commit().await?;

        Ok(Some(output))
    }

    async fn finish_login<F>(
        &self,
        id: UsuarioId,
        upgraded_hash: Option<&HashedPassword>,
        apply: F,
    ) -> AccountsResult<Option<LockStatus>>
    where
        F: FnOnce(&mut LockoutState) -> LockStatus + Send,
    {
        let mut tx = self.pool.begin().await?;

        // Same lock as `update_lockout`: a failure that locked the row while
        // this password was being verified is seen here.
        let row = sqlx::query_as::<_, LockoutRow>(
            r#"
            SELECT intentos_fallidos, bloqueado_hasta, ultimo_intento_fallido
            FROM usuarios
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let before = row.into_state();
        let mut state = before;
        let status = apply(&mut state);

        if state != before {
            write_lockout(&mut tx, id, &state).await?;
        }
        if !status.is_locked() {
            if let Some(hash) = upgraded_hash {
                sqlx::query("UPDATE usuarios SET hashed_password = $2 WHERE id = $1")
                    .bind(id.get())
                    .bind(hash.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;

        Ok(Some(status))
    }

    async fn update_password_hash(
        &self,
        id: UsuarioId,
        password_hash: &HashedPassword,
    ) -> AccountsResult<()> {
        let updated = sqlx::query(
            "UPDATE usuarios SET hashed_password = $2, fecha_modificacion = now() WHERE id = $1",
        )
        .bind(id.get())
        .bind(password_hash.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AccountsError::UsuarioNotFound);
        }
        Ok(())
    }
}

async fn write_lockout(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: UsuarioId,
    state: &LockoutState,
) -> AccountsResult<()> {
    sqlx::query(
        r#"
        UPDATE usuarios SET
            intentos_fallidos = $2,
            bloqueado_hasta = $3,
            ultimo_intento_fallido = $4
        WHERE id = $1
        "#,
    )
    .bind(id.get())
    .bind(attempts_to_db(state.failed_attempts))
    .bind(state.locked_until)
    .bind(state.last_failed_attempt)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn attempts_to_db(attempts: u32) -> i32 {
    i32::try_from(attempts).unwrap_or(i32::MAX)
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UsuarioRow {
    id: i64,
    nombre: String,
    apellido: String,
    email: String,
    username: String,
    is_active: bool,
    is_superuser: bool,
    role: String,
    corredor_numero: Option<i64>,
    comision_porcentaje: f64,
    telefono: Option<String>,
    fecha_creacion: DateTime<Utc>,
    fecha_modificacion: DateTime<Utc>,
}

impl UsuarioRow {
    fn into_usuario(self) -> AccountsResult<Usuario> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AccountsError::Internal(format!("Invalid role in database: {}", self.role)))?;

        let profile = UsuarioProfile::new(ProfileFields {
            nombre: self.nombre,
            apellido: self.apellido,
            email: Email::from_db(self.email),
            username: Username::from_db(self.username),
            is_enabled: self.is_active,
            is_superuser: self.is_superuser,
            role,
            corredor_numero: self.corredor_numero,
            comision_porcentaje: self.comision_porcentaje,
            telefono: self.telefono,
        })
        .map_err(|e| AccountsError::Internal(format!("Invalid usuario {} in database: {e}", self.id)))?;

        Ok(Usuario {
            id: UsuarioId::new(self.id),
            profile,
            fecha_creacion: self.fecha_creacion,
            fecha_modificacion: self.fecha_modificacion,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LockoutRow {
    intentos_fallidos: i32,
    bloqueado_hasta: Option<DateTime<Utc>>,
    ultimo_intento_fallido: Option<DateTime<Utc>>,
}

impl LockoutRow {
    fn into_state(self) -> LockoutState {
        LockoutState {
            failed_attempts: u32::try_from(self.intentos_fallidos).unwrap_or(0),
            locked_until: self.bloqueado_hasta,
            last_failed_attempt: self.ultimo_intento_fallido,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    hashed_password: String,
    #[sqlx(flatten)]
    lockout: LockoutRow,
}

impl CredentialRow {
    fn into_credential(self) -> Credential {
        Credential {
            usuario_id: UsuarioId::new(self.id),
            password_hash: HashedPassword::from_stored(self.hashed_password),
            lockout: self.lockout.into_state(),
        }
    }
}
