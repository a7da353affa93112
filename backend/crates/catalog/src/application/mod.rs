//! Application Layer
//!
//! Use cases for the reference-data slices. Reads are open to any
//! authenticated usuario; writes check a `<resource>:write` permission.

pub mod config;
pub mod monedas;
pub mod seed;
pub mod tipos_documento;

use accounts::models::Usuario;

use crate::error::{CatalogError, CatalogResult};

// Re-exports
pub use config::CatalogConfig;
pub use monedas::{
    CreateMonedaInput, MONEDAS_WRITE, ManageMonedasUseCase, QueryMonedasUseCase,
    UpdateMonedaInput,
};
pub use seed::{SeedReport, seed_reference_data};
pub use tipos_documento::{
    CreateTipoDocumentoInput, ManageTiposDocumentoUseCase, QueryTiposDocumentoUseCase,
    TIPOS_DOCUMENTO_WRITE, UpdateTipoDocumentoInput,
};

fn require(actor: &Usuario, permission: &'static str) -> CatalogResult<()> {
    if actor.has_permission(permission) {
        return Ok(());
    }
    tracing::warn!(usuario_id = %actor.id, permission, "Permission denied");
    Err(CatalogError::Forbidden)
}
