//! Change Password Use Case
//!
//! A usuario may change their own password by proving the current one. A
//! superuser may set anyone's password; the current password is only checked
//! when they change their own.

use std::sync::Arc;

use kernel::id::UsuarioId;
use platform::password::{ClearTextPassword, PasswordHasher};

use crate::domain::entity::Usuario;
use crate::domain::repository::{AccountsStore, CredentialRepository, UsuarioRepository};
use crate::error::{AccountsError, AccountsResult};

pub struct ChangePasswordInput {
    pub usuario_id: UsuarioId,
    pub current_password: Option<String>,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<S>
where
    S: AccountsStore,
{
    store: Arc<S>,
    hasher: PasswordHasher,
}

impl<S> ChangePasswordUseCase<S>
where
    S: AccountsStore,
{
    pub fn new(store: Arc<S>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn execute(&self, actor: &Usuario, input: ChangePasswordInput) -> AccountsResult<()> {
        let own_account = actor.id == input.usuario_id;
        if !own_account && !actor.is_superuser() {
            tracing::warn!(
                usuario_id = %actor.id,
                target = %input.usuario_id,
                "Attempt to change another usuario's password"
            );
            return Err(AccountsError::Forbidden);
        }

        if self.store.find_by_id(input.usuario_id).await?.is_none() {
            return Err(AccountsError::UsuarioNotFound);
        }

        let new_password = ClearTextPassword::new(input.new_password)?;

        if own_account {
            let current = ClearTextPassword::submitted(input.current_password.unwrap_or_default());
            if current.is_empty() {
                return Err(AccountsError::invalid(
                    "contrasena_actual",
                    "current password is required",
                ));
            }
            let credential = self
                .store
                .find_credential(input.usuario_id)
                .await?
                .ok_or(AccountsError::UsuarioNotFound)?;
            let (valid, _) = self
                .hasher
                .verify_blocking(current, credential.password_hash)
                .await?;
            if !valid {
                return Err(AccountsError::InvalidCredentials);
            }
        }

        let hash = self.hasher.hash_blocking(new_password).await?;
        self.store
            .update_password_hash(input.usuario_id, &hash)
            .await?;

        tracing::info!(
            usuario_id = %input.usuario_id,
            changed_by = %actor.id,
            "Password changed"
        );
        Ok(())
    }
}
