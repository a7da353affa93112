//! Update Usuario Use Case
//!
//! Partial update of a usuario's profile, including role reassignment and
//! activation. Deactivating an account also clears its failed-login counters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;

use crate::application::register_usuario::require;
use crate::domain::entity::{LockoutState, Usuario};
use crate::domain::repository::{AccountsStore, CredentialRepository, UsuarioRepository};
use crate::domain::services::permissions::{
    USUARIOS_MANAGE_ROLES, USUARIOS_MANAGE_SUPERUSERS, USUARIOS_WRITE,
};
use crate::domain::value_object::{Email, Role, Username};
use crate::error::{AccountsError, AccountsResult};

/// Fields left as `None` are not touched. `corredor_numero` and `telefono`
/// use a nested `Option` so they can be cleared.
#[derive(Debug, Default)]
pub struct UpdateUsuarioInput {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub is_enabled: Option<bool>,
    pub is_superuser: Option<bool>,
    pub role: Option<Role>,
    pub corredor_numero: Option<Option<i64>>,
    pub comision_porcentaje: Option<f64>,
    pub telefono: Option<Option<String>>,
}

pub struct UpdateUsuarioUseCase<S>
where
    S: AccountsStore,
{
    store: Arc<S>,
}

impl<S> UpdateUsuarioUseCase<S>
where
    S: AccountsStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        actor: &Usuario,
        id: UsuarioId,
        input: UpdateUsuarioInput,
        now: DateTime<Utc>,
    ) -> AccountsResult<Usuario> {
        require(actor, USUARIOS_WRITE)?;

        let mut usuario = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AccountsError::UsuarioNotFound)?;
        let was_enabled = usuario.profile.is_enabled;

        if let Some(username) = input.username {
            let username = Username::new(username)?;
            if username.canonical() != usuario.profile.username.canonical() {
                if let Some(other) = self.store.find_by_username(&username).await? {
                    if other.id != id {
                        return Err(AccountsError::UsernameTaken);
                    }
                }
            }
            usuario.profile.username = username;
        }

        if let Some(email) = input.email {
            let email = Email::new(email)?;
            if email != usuario.profile.email {
                if let Some(other) = self.store.find_by_email(&email).await? {
                    if other.id != id {
                        return Err(AccountsError::EmailTaken);
                    }
                }
            }
            usuario.profile.email = email;
        }

        if let Some(nombre) = input.nombre {
            usuario.profile.set_nombre(nombre)?;
        }
        if let Some(apellido) = input.apellido {
            usuario.profile.set_apellido(apellido)?;
        }
        if let Some(telefono) = input.telefono {
            usuario.profile.set_telefono(telefono)?;
        }
        if let Some(comision) = input.comision_porcentaje {
            usuario.profile.set_comision(comision)?;
        }

        if input.role.is_some() || input.corredor_numero.is_some() {
            let role = input.role.unwrap_or(usuario.role());
            if role != usuario.role() {
                require(actor, USUARIOS_MANAGE_ROLES)?;
            }
            let numero = input
                .corredor_numero
                .unwrap_or(usuario.profile.corredor_numero());
            usuario.profile.assign_role(role, numero)?;
        }

        if let Some(is_superuser) = input.is_superuser {
            if is_superuser != usuario.profile.is_superuser {
                require(actor, USUARIOS_MANAGE_SUPERUSERS)?;
            }
            usuario.profile.is_superuser = is_superuser;
        }

        if let Some(is_enabled) = input.is_enabled {
            usuario.profile.is_enabled = is_enabled;
        }

        let updated = self.store.update(&usuario, now).await?;

        if was_enabled && !updated.profile.is_enabled {
            self.store
                .update_lockout(id, |state| *state = LockoutState::cleared())
                .await?;
            tracing::info!(usuario_id = %id, "Usuario deactivated");
        } else if !was_enabled && updated.profile.is_enabled {
            tracing::info!(usuario_id = %id, "Usuario activated");
        }

        Ok(updated)
    }
}
