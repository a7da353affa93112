//! Authentication Service
//!
//! Username/password check with account lockout and transparent migration of
//! legacy password hashes.
//!
//! Rejections are deliberately coarse: unknown usernames and wrong passwords
//! both produce [`AccountsError::InvalidCredentials`]. A locked account is
//! reported before the password is looked at; a disabled account only after
//! the password has been verified.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::{ClearTextPassword, PasswordHasher};

use crate::domain::entity::Usuario;
use crate::domain::repository::{AccountsStore, CredentialRepository, UsuarioRepository};
use crate::domain::services::{LockStatus, LockoutPolicy};
use crate::domain::value_object::Username;
use crate::error::{AccountsError, AccountsResult};

pub struct AuthenticationService<S>
where
    S: AccountsStore,
{
    store: Arc<S>,
    hasher: PasswordHasher,
    policy: LockoutPolicy,
}

impl<S> AuthenticationService<S>
where
    S: AccountsStore,
{
    pub fn new(store: Arc<S>, hasher: PasswordHasher, policy: LockoutPolicy) -> Self {
        Self {
            store,
            hasher,
            policy,
        }
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: String,
        now: DateTime<Utc>,
    ) -> AccountsResult<Usuario> {
        let password = ClearTextPassword::submitted(password);
        if username.trim().is_empty() || password.is_empty() {
            return Err(AccountsError::InvalidCredentials);
        }

        let Some(username) = Username::lookup(username) else {
            return Err(AccountsError::InvalidCredentials);
        };

        let Some(usuario) = self.store.find_by_username(&username).await? else {
            tracing::warn!("Login attempt for unknown username");
            return Err(AccountsError::InvalidCredentials);
        };

        let policy = self.policy;
        let check = self
            .store
            .update_lockout(usuario.id, move |state| policy.check_lock(state, now))
            .await?
            .ok_or(AccountsError::InvalidCredentials)?;

        if check.expired_lock_cleared {
            tracing::info!(usuario_id = %usuario.id, "Expired account lock cleared");
        }
        if let LockStatus::Locked { until, .. } = check.status {
            tracing::warn!(usuario_id = %usuario.id, locked_until = %until, "Login attempt on locked account");
            return Err(AccountsError::AccountLocked {
                minutes: check.status.remaining_minutes(),
            });
        }

        let credential = self
            .store
            .find_credential(usuario.id)
            .await?
            .ok_or(AccountsError::InvalidCredentials)?;

        let (valid, password) = self
            .hasher
            .verify_blocking(password, credential.password_hash.clone())
            .await?;

        if !valid {
            // If this write fails the error propagates and the login is
            // rejected without a recorded attempt.
            let status = self
                .store
                .update_lockout(usuario.id, move |state| {
                    let status = policy.record_failure(state, now);
                    (status, state.failed_attempts)
                })
                .await?;

            match status {
                Some((LockStatus::Locked { until, .. }, attempts)) => {
                    tracing::warn!(usuario_id = %usuario.id, attempts, locked_until = %until, "Account locked after failed logins");
                }
                Some((LockStatus::Normal, attempts)) => {
                    tracing::warn!(usuario_id = %usuario.id, attempts, "Failed login attempt");
                }
                None => {}
            }
            return Err(AccountsError::InvalidCredentials);
        }

        let upgraded = if credential.password_hash.is_legacy() {
            match self.hasher.hash_blocking(password).await {
                Ok(hash) => Some(hash),
                Err(e) => {
                    tracing::warn!(usuario_id = %usuario.id, error = %e, "Could not re-hash legacy password");
                    None
                }
            }
        } else {
            None
        };

        // Another attempt may have locked the account while the password was
        // being verified; that lock wins.
        let status = self
            .store
            .finish_login(usuario.id, upgraded.as_ref(), move |state| {
                let check = policy.check_lock(state, now);
                if !check.status.is_locked() {
                    policy.record_success(state);
                }
                check.status
            })
            .await?
            .ok_or(AccountsError::InvalidCredentials)?;

        if let LockStatus::Locked { until, .. } = status {
            tracing::warn!(usuario_id = %usuario.id, locked_until = %until, "Account locked during login");
            return Err(AccountsError::AccountLocked {
                minutes: status.remaining_minutes(),
            });
        }

        if upgraded.is_some() {
            tracing::info!(usuario_id = %usuario.id, "Legacy password hash migrated");
        }

        if !usuario.can_authenticate() {
            tracing::warn!(usuario_id = %usuario.id, "Login attempt on disabled account");
            return Err(AccountsError::AccountDisabled);
        }

        Ok(usuario)
    }
}
