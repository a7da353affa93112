//! Catalog Backend Module
//!
//! Reference data shared by the rest of the back office: monedas and tipos de
//! documento.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, code value objects, repository traits
//! - `application/` - Use cases, config, startup seeding
//! - `infra/` - PostgreSQL repositories and cache-aside decorators
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! Reads are served through a process-local TTL cache; every write
//! invalidates the cached lookups of the entity it touched.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::CatalogConfig;
pub use application::seed::{SeedReport, seed_reference_data};
pub use error::{CatalogError, CatalogResult};
pub use infra::cached::{CachedMonedaRepository, CachedTipoDocumentoRepository};
pub use infra::postgres::PgCatalogRepository;
pub use presentation::router::{monedas_router, tipos_documento_router};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}
