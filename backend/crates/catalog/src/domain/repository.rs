//! Repository Traits

use chrono::{DateTime, Utc};
use kernel::id::{MonedaId, TipoDocumentoId};

use crate::domain::entity::{Moneda, MonedaFields, TipoDocumento, TipoDocumentoFields};
use crate::domain::value_object::{CodigoDocumento, CodigoMoneda};
use crate::error::CatalogResult;

#[trait_variant::make(MonedaRepository: Send)]
pub trait LocalMonedaRepository {
    async fn create(&self, fields: &MonedaFields, now: DateTime<Utc>) -> CatalogResult<Moneda>;

    async fn find_by_id(&self, id: MonedaId) -> CatalogResult<Option<Moneda>>;

    async fn find_by_codigo(&self, codigo: &CodigoMoneda) -> CatalogResult<Option<Moneda>>;

    /// Active monedas ordered by codigo
    async fn list_active(&self) -> CatalogResult<Vec<Moneda>>;

    async fn update(&self, moneda: &Moneda, now: DateTime<Utc>) -> CatalogResult<Moneda>;

    /// Soft delete. `false` when no such moneda exists.
    async fn deactivate(&self, id: MonedaId, now: DateTime<Utc>) -> CatalogResult<bool>;
}

#[trait_variant::make(TipoDocumentoRepository: Send)]
pub trait LocalTipoDocumentoRepository {
    /// Insert; when `fields.es_default` is set the previous default loses the
    /// flag in the same transaction.
    async fn create(
        &self,
        fields: &TipoDocumentoFields,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento>;

    async fn find_by_id(&self, id: TipoDocumentoId) -> CatalogResult<Option<TipoDocumento>>;

    async fn find_by_codigo(
        &self,
        codigo: &CodigoDocumento,
    ) -> CatalogResult<Option<TipoDocumento>>;

    /// The active default, if any
    async fn find_default(&self) -> CatalogResult<Option<TipoDocumento>>;

    async fn list_active(&self) -> CatalogResult<Vec<TipoDocumento>>;

    /// Same default handling as [`create`](LocalTipoDocumentoRepository::create).
    async fn update(
        &self,
        tipo: &TipoDocumento,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento>;

    async fn deactivate(&self, id: TipoDocumentoId, now: DateTime<Utc>) -> CatalogResult<bool>;
}

/// A moneda repository that can be shared across handlers
pub trait MonedaStore: MonedaRepository + Send + Sync + 'static {}

impl<T> MonedaStore for T where T: MonedaRepository + Send + Sync + 'static {}

/// A tipo de documento repository that can be shared across handlers
pub trait TipoDocumentoStore: TipoDocumentoRepository + Send + Sync + 'static {}

impl<T> TipoDocumentoStore for T where T: TipoDocumentoRepository + Send + Sync + 'static {}
