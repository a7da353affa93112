//! Register Usuario Use Case
//!
//! Admin-only creation of a new account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::{ClearTextPassword, PasswordHasher};

use crate::domain::entity::{ProfileFields, Usuario, UsuarioProfile};
use crate::domain::repository::UsuarioRepository;
use crate::domain::services::permissions::{USUARIOS_MANAGE_SUPERUSERS, USUARIOS_WRITE};
use crate::domain::value_object::{Email, Role, Username};
use crate::error::{AccountsError, AccountsResult};

pub struct RegisterUsuarioInput {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub is_enabled: bool,
    pub is_superuser: bool,
    pub role: Role,
    pub corredor_numero: Option<i64>,
    pub comision_porcentaje: f64,
    pub telefono: Option<String>,
}

pub struct RegisterUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    usuarios: Arc<U>,
    hasher: PasswordHasher,
}

impl<U> RegisterUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    pub fn new(usuarios: Arc<U>, hasher: PasswordHasher) -> Self {
        Self { usuarios, hasher }
    }

    /// `actor` is the authenticated usuario performing the registration;
    /// `None` only for bootstrap seeding.
    pub async fn execute(
        &self,
        actor: Option<&Usuario>,
        input: RegisterUsuarioInput,
        now: DateTime<Utc>,
    ) -> AccountsResult<Usuario> {
        if let Some(actor) = actor {
            require(actor, USUARIOS_WRITE)?;
            if input.is_superuser {
                require(actor, USUARIOS_MANAGE_SUPERUSERS)?;
            }
        }

        let username = Username::new(&input.username)?;
        let email = Email::new(&input.email)?;
        let password = ClearTextPassword::new(input.password)?;

        let profile = UsuarioProfile::new(ProfileFields {
            nombre: input.nombre,
            apellido: input.apellido,
            email,
            username,
            is_enabled: input.is_enabled,
            is_superuser: input.is_superuser,
            role: input.role,
            corredor_numero: input.corredor_numero,
            comision_porcentaje: input.comision_porcentaje,
            telefono: input.telefono,
        })?;

        if self.usuarios.find_by_username(&profile.username).await?.is_some() {
            return Err(AccountsError::UsernameTaken);
        }
        if self.usuarios.find_by_email(&profile.email).await?.is_some() {
            return Err(AccountsError::EmailTaken);
        }

        let hash = self.hasher.hash_blocking(password).await?;
        let usuario = self.usuarios.create(&profile, &hash, now).await?;

        tracing::info!(
            usuario_id = %usuario.id,
            role = %usuario.role(),
            is_superuser = usuario.is_superuser(),
            "Usuario registered"
        );

        Ok(usuario)
    }
}

/// Reject `actor` unless it holds `permission`.
pub(crate) fn require(actor: &Usuario, permission: &str) -> AccountsResult<()> {
    if actor.has_permission(permission) {
        Ok(())
    } else {
        tracing::warn!(usuario_id = %actor.id, permission, "Permission denied");
        Err(AccountsError::Forbidden)
    }
}
