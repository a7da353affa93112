//! Accounts Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Usuario entity, lockout policy, permission table, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, bearer middleware, router
//!
//! ## Features
//! - Username + password login returning a bearer token
//! - Account lockout after repeated failures, with lazy expiry
//! - Transparent migration of legacy bcrypt hashes to Argon2id
//! - Role-based permissions (ADMIN, CORREDOR, ASISTENTE) with a superuser bypass
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Unknown username and wrong password are indistinguishable to clients
//! - Lockout counters are updated under a row lock

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AccountsConfig;
pub use error::{AccountsError, AccountsResult};
pub use infra::postgres::PgAccountsRepository;
pub use presentation::handlers::AccountsAppState;
pub use presentation::middleware::{CurrentUsuario, require_usuario};
pub use presentation::router::{usuarios_router, usuarios_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod permissions {
    pub use crate::domain::services::permissions::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAccountsRepository as AccountsStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
