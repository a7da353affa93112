//! Repository Traits
//!
//! Interfaces for usuario persistence. Implementations live in `infra`
//! (PostgreSQL) and in the crate's tests (in-memory).

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;
use platform::password::HashedPassword;

use crate::domain::entity::{Credential, LockoutState, Usuario, UsuarioProfile};
use crate::domain::services::LockStatus;
use crate::domain::value_object::{Email, Username};
use crate::error::AccountsResult;

#[trait_variant::make(UsuarioRepository: Send)]
pub trait LocalUsuarioRepository {
    /// Insert a new usuario with its initial password hash.
    async fn create(
        &self,
        profile: &UsuarioProfile,
        password_hash: &HashedPassword,
        now: DateTime<Utc>,
    ) -> AccountsResult<Usuario>;

    async fn find_by_id(&self, id: UsuarioId) -> AccountsResult<Option<Usuario>>;

    /// Case-insensitive lookup on the canonical username
    async fn find_by_username(&self, username: &Username) -> AccountsResult<Option<Usuario>>;

    async fn find_by_email(&self, email: &Email) -> AccountsResult<Option<Usuario>>;

    async fn list(&self, skip: i64, limit: i64) -> AccountsResult<Vec<Usuario>>;

    async fn list_by_corredor(&self, corredor_numero: i64) -> AccountsResult<Vec<Usuario>>;

    /// Persist profile changes; returns the stored row.
    async fn update(&self, usuario: &Usuario, now: DateTime<Utc>) -> AccountsResult<Usuario>;

    /// Hard delete. `false` when no such usuario existed.
    async fn delete(&self, id: UsuarioId) -> AccountsResult<bool>;

    async fn count(&self) -> AccountsResult<i64>;
}

#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    async fn find_credential(&self, id: UsuarioId) -> AccountsResult<Option<Credential>>;

    /// Read-modify-write of the lockout counters, serialized per usuario.
    ///
    /// `apply` runs while the row is locked; the new state is written only if
    /// it differs from the old one. Returns `None` when the usuario does not
    /// exist.
    async fn update_lockout<F, T>(&self, id: UsuarioId, apply: F) -> AccountsResult<Option<T>>
    where
        F: FnOnce(&mut LockoutState) -> T + Send,
        T: Send;

    /// Settle a login whose password already verified, under the same row
    /// lock as [`update_lockout`](LocalCredentialRepository::update_lockout).
    ///
    /// `apply` sees the current counters and returns the lock status it found.
    /// Lockout changes are written as in `update_lockout`; `upgraded_hash` is
    /// written in the same transaction, and only when that status is not
    /// locked. Returns `None` when the usuario does not exist.
    async fn finish_login<F>(
        &self,
        id: UsuarioId,
        upgraded_hash: Option<&HashedPassword>,
        apply: F,
    ) -> AccountsResult<Option<LockStatus>>
    where
        F: FnOnce(&mut LockoutState) -> LockStatus + Send;

    async fn update_password_hash(
        &self,
        id: UsuarioId,
        password_hash: &HashedPassword,
    ) -> AccountsResult<()>;
}

/// Everything the accounts use cases need from storage
pub trait AccountsStore: UsuarioRepository + CredentialRepository + Send + Sync + 'static {}

impl<T> AccountsStore for T where T: UsuarioRepository + CredentialRepository + Send + Sync + 'static {}
