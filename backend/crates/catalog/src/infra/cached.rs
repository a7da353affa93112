//! Cache-aside repositories.
//!
//! Each decorator wraps another repository of the same trait. Reads go
//! through a [`TtlCache`]; every write is forwarded first and then drops all
//! cached lookups for that entity, including negative (`None`) results.

use chrono::{DateTime, Utc};
use kernel::id::{MonedaId, TipoDocumentoId};
use platform::cache::TtlCache;

use crate::application::config::CatalogConfig;
use crate::domain::entity::{Moneda, MonedaFields, TipoDocumento, TipoDocumentoFields};
use crate::domain::repository::{MonedaRepository, TipoDocumentoRepository};
use crate::domain::value_object::{CodigoDocumento, CodigoMoneda};
use crate::error::CatalogResult;

fn cache<K, V>(config: &CatalogConfig) -> TtlCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    TtlCache::with_capacity(config.cache_ttl, config.cache_capacity)
}

// ============================================================================
// Monedas
// ============================================================================

pub struct CachedMonedaRepository<R> {
    inner: R,
    by_id: TtlCache<MonedaId, Option<Moneda>>,
    by_codigo: TtlCache<CodigoMoneda, Option<Moneda>>,
    active: TtlCache<(), Vec<Moneda>>,
}

impl<R> CachedMonedaRepository<R>
where
    R: MonedaRepository + Sync,
{
    pub fn new(inner: R, config: &CatalogConfig) -> Self {
        Self {
            inner,
            by_id: cache(config),
            by_codigo: cache(config),
            active: cache(config),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Drop every cached moneda lookup.
    pub fn invalidate(&self) {
        self.by_id.invalidate_all();
        self.by_codigo.invalidate_all();
        self.active.invalidate_all();
        tracing::debug!("Moneda cache invalidated");
    }
}

impl<R> MonedaRepository for CachedMonedaRepository<R>
where
    R: MonedaRepository + Sync,
{
    async fn create(&self, fields: &MonedaFields, now: DateTime<Utc>) -> CatalogResult<Moneda> {
        let moneda = self.inner.create(fields, now).await?;
        self.invalidate();
        Ok(moneda)
    }

    async fn find_by_id(&self, id: MonedaId) -> CatalogResult<Option<Moneda>> {
        self.by_id
            .get_or_try_insert_with(id, || self.inner.find_by_id(id))
            .await
    }

    async fn find_by_codigo(&self, codigo: &CodigoMoneda) -> CatalogResult<Option<Moneda>> {
        self.by_codigo
            .get_or_try_insert_with(codigo.clone(), || self.inner.find_by_codigo(codigo))
            .await
    }

    async fn list_active(&self) -> CatalogResult<Vec<Moneda>> {
        self.active
            .get_or_try_insert_with((), || self.inner.list_active())
            .await
    }

    async fn update(&self, moneda: &Moneda, now: DateTime<Utc>) -> CatalogResult<Moneda> {
        let result = self.inner.update(moneda, now).await;
        self.invalidate();
        result
    }

    async fn deactivate(&self, id: MonedaId, now: DateTime<Utc>) -> CatalogResult<bool> {
        let result = self.inner.deactivate(id, now).await;
        self.invalidate();
        result
    }
}

// ============================================================================
// Tipos de documento
// ============================================================================

pub struct CachedTipoDocumentoRepository<R> {
    inner: R,
    by_id: TtlCache<TipoDocumentoId, Option<TipoDocumento>>,
    by_codigo: TtlCache<CodigoDocumento, Option<TipoDocumento>>,
    default: TtlCache<(), Option<TipoDocumento>>,
    active: TtlCache<(), Vec<TipoDocumento>>,
}

impl<R> CachedTipoDocumentoRepository<R>
where
    R: TipoDocumentoRepository + Sync,
{
    pub fn new(inner: R, config: &CatalogConfig) -> Self {
        Self {
            inner,
            by_id: cache(config),
            by_codigo: cache(config),
            default: cache(config),
            active: cache(config),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Drop every cached tipo de documento lookup. A write to one row can
    /// change the default flag of another, so nothing is kept.
    pub fn invalidate(&self) {
        self.by_id.invalidate_all();
        self.by_codigo.invalidate_all();
        self.default.invalidate_all();
        self.active.invalidate_all();
        tracing::debug!("Tipo de documento cache invalidated");
    }
}

impl<R> TipoDocumentoRepository for CachedTipoDocumentoRepository<R>
where
    R: TipoDocumentoRepository + Sync,
{
    async fn create(
        &self,
        fields: &TipoDocumentoFields,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        let tipo = self.inner.create(fields, now).await?;
        self.invalidate();
        Ok(tipo)
    }

    async fn find_by_id(&self, id: TipoDocumentoId) -> CatalogResult<Option<TipoDocumento>> {
        self.by_id
            .get_or_try_insert_with(id, || self.inner.find_by_id(id))
            .await
    }

    async fn find_by_codigo(
        &self,
        codigo: &CodigoDocumento,
    ) -> CatalogResult<Option<TipoDocumento>> {
        self.by_codigo
            .get_or_try_insert_with(codigo.clone(), || self.inner.find_by_codigo(codigo))
            .await
    }

    async fn find_default(&self) -> CatalogResult<Option<TipoDocumento>> {
        self.default
            .get_or_try_insert_with((), || self.inner.find_default())
            .await
    }

    async fn list_active(&self) -> CatalogResult<Vec<TipoDocumento>> {
        self.active
            .get_or_try_insert_with((), || self.inner.list_active())
            .await
    }

    async fn update(
        &self,
        tipo: &TipoDocumento,
        now: DateTime<Utc>,
    ) -> CatalogResult<TipoDocumento> {
        let result = self.inner.update(tipo, now).await;
        self.invalidate();
        result
    }

    async fn deactivate(&self, id: TipoDocumentoId, now: DateTime<Utc>) -> CatalogResult<bool> {
        let result = self.inner.deactivate(id, now).await;
        self.invalidate();
        result
    }
}
