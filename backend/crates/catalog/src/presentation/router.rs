//! Catalog Routers

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::application::config::CatalogConfig;
use crate::domain::repository::{MonedaStore, TipoDocumentoStore};
use crate::infra::cached::{CachedMonedaRepository, CachedTipoDocumentoRepository};
use crate::infra::postgres::PgCatalogRepository;
use crate::presentation::handlers;

/// `/monedas` over PostgreSQL with the cache in front
pub fn monedas_router(repo: PgCatalogRepository, config: &CatalogConfig) -> Router {
    monedas_router_generic(Arc::new(CachedMonedaRepository::new(repo, config)))
}

/// `/tipos-documento` over PostgreSQL with the cache in front
pub fn tipos_documento_router(repo: PgCatalogRepository, config: &CatalogConfig) -> Router {
    tipos_documento_router_generic(Arc::new(CachedTipoDocumentoRepository::new(repo, config)))
}

pub fn monedas_router_generic<R>(repo: Arc<R>) -> Router
where
    R: MonedaStore,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_monedas::<R>).post(handlers::create_moneda::<R>),
        )
        .route("/codigo/{codigo}", get(handlers::get_moneda_by_codigo::<R>))
        .route(
            "/{id}",
            get(handlers::get_moneda::<R>)
                .put(handlers::update_moneda::<R>)
                .delete(handlers::delete_moneda::<R>),
        )
        .with_state(repo)
}

pub fn tipos_documento_router_generic<R>(repo: Arc<R>) -> Router
where
    R: TipoDocumentoStore,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_tipos_documento::<R>).post(handlers::create_tipo_documento::<R>),
        )
        .route("/default", get(handlers::get_default_tipo_documento::<R>))
        .route(
            "/codigo/{codigo}",
            get(handlers::get_tipo_documento_by_codigo::<R>),
        )
        .route(
            "/{id}",
            get(handlers::get_tipo_documento::<R>)
                .put(handlers::update_tipo_documento::<R>)
                .delete(handlers::delete_tipo_documento::<R>),
        )
        .with_state(repo)
}
