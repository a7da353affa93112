//! Credential entity.
//!
//! Password hash and failed-login bookkeeping for one usuario. Kept apart from
//! the profile so the hash is never serialized by accident.

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;
use platform::password::HashedPassword;

/// Failed-login counters, mutated only through
/// [`LockoutPolicy`](crate::domain::services::lockout::LockoutPolicy)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutState {
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_failed_attempt: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Counters back to zero, no lock.
    pub fn cleared() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct Credential {
    pub usuario_id: UsuarioId,
    pub password_hash: HashedPassword,
    pub lockout: LockoutState,
}

impl Credential {
    pub fn new(usuario_id: UsuarioId, password_hash: HashedPassword) -> Self {
        Self {
            usuario_id,
            password_hash,
            lockout: LockoutState::cleared(),
        }
    }
}
