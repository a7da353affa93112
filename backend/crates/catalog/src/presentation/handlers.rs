//! HTTP Handlers

use std::sync::Arc;

use accounts::CurrentUsuario;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use kernel::id::{MonedaId, TipoDocumentoId};

use crate::application::{
    CreateMonedaInput, CreateTipoDocumentoInput, ManageMonedasUseCase,
    ManageTiposDocumentoUseCase, QueryMonedasUseCase, QueryTiposDocumentoUseCase,
    UpdateMonedaInput, UpdateTipoDocumentoInput,
};
use crate::domain::repository::{MonedaStore, TipoDocumentoStore};
use crate::error::CatalogResult;
use crate::presentation::dto::{
    CreateMonedaRequest, CreateTipoDocumentoRequest, MonedaResponse, TipoDocumentoResponse,
    UpdateMonedaRequest, UpdateTipoDocumentoRequest,
};

// ============================================================================
// Monedas
// ============================================================================

/// GET /api/v1/monedas
pub async fn list_monedas<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
) -> CatalogResult<Json<Vec<MonedaResponse>>>
where
    R: MonedaStore,
{
    let monedas = QueryMonedasUseCase::new(repo).list().await?;
    Ok(Json(monedas.iter().map(MonedaResponse::from).collect()))
}

/// GET /api/v1/monedas/{id}
pub async fn get_moneda<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
    Path(id): Path<MonedaId>,
) -> CatalogResult<Json<MonedaResponse>>
where
    R: MonedaStore,
{
    let moneda = QueryMonedasUseCase::new(repo).get(id).await?;
    Ok(Json(MonedaResponse::from(&moneda)))
}

/// GET /api/v1/monedas/codigo/{codigo}
pub async fn get_moneda_by_codigo<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
    Path(codigo): Path<String>,
) -> CatalogResult<Json<MonedaResponse>>
where
    R: MonedaStore,
{
    let moneda = QueryMonedasUseCase::new(repo).get_by_codigo(&codigo).await?;
    Ok(Json(MonedaResponse::from(&moneda)))
}

/// POST /api/v1/monedas
pub async fn create_moneda<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Json(req): Json<CreateMonedaRequest>,
) -> CatalogResult<(StatusCode, Json<MonedaResponse>)>
where
    R: MonedaStore,
{
    let input = CreateMonedaInput {
        codigo: req.codigo,
        nombre: req.nombre,
        simbolo: req.simbolo,
    };
    let moneda = ManageMonedasUseCase::new(repo)
        .create(&actor, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(MonedaResponse::from(&moneda))))
}

/// PUT /api/v1/monedas/{id}
pub async fn update_moneda<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<MonedaId>,
    Json(req): Json<UpdateMonedaRequest>,
) -> CatalogResult<Json<MonedaResponse>>
where
    R: MonedaStore,
{
    let input = UpdateMonedaInput {
        codigo: req.codigo,
        nombre: req.nombre,
        simbolo: req.simbolo,
        esta_activo: req.esta_activo,
    };
    let moneda = ManageMonedasUseCase::new(repo)
        .update(&actor, id, input, Utc::now())
        .await?;
    Ok(Json(MonedaResponse::from(&moneda)))
}

/// DELETE /api/v1/monedas/{id}
pub async fn delete_moneda<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<MonedaId>,
) -> CatalogResult<StatusCode>
where
    R: MonedaStore,
{
    ManageMonedasUseCase::new(repo)
        .delete(&actor, id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tipos de documento
// ============================================================================

/// GET /api/v1/tipos-documento
pub async fn list_tipos_documento<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
) -> CatalogResult<Json<Vec<TipoDocumentoResponse>>>
where
    R: TipoDocumentoStore,
{
    let tipos = QueryTiposDocumentoUseCase::new(repo).list().await?;
    Ok(Json(tipos.iter().map(TipoDocumentoResponse::from).collect()))
}

/// GET /api/v1/tipos-documento/default
pub async fn get_default_tipo_documento<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
) -> CatalogResult<Json<TipoDocumentoResponse>>
where
    R: TipoDocumentoStore,
{
    let tipo = QueryTiposDocumentoUseCase::new(repo).get_default().await?;
    Ok(Json(TipoDocumentoResponse::from(&tipo)))
}

/// GET /api/v1/tipos-documento/{id}
pub async fn get_tipo_documento<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
    Path(id): Path<TipoDocumentoId>,
) -> CatalogResult<Json<TipoDocumentoResponse>>
where
    R: TipoDocumentoStore,
{
    let tipo = QueryTiposDocumentoUseCase::new(repo).get(id).await?;
    Ok(Json(TipoDocumentoResponse::from(&tipo)))
}

/// GET /api/v1/tipos-documento/codigo/{codigo}
pub async fn get_tipo_documento_by_codigo<R>(
    State(repo): State<Arc<R>>,
    _: CurrentUsuario,
    Path(codigo): Path<String>,
) -> CatalogResult<Json<TipoDocumentoResponse>>
where
    R: TipoDocumentoStore,
{
    let tipo = QueryTiposDocumentoUseCase::new(repo)
        .get_by_codigo(&codigo)
        .await?;
    Ok(Json(TipoDocumentoResponse::from(&tipo)))
}

/// POST /api/v1/tipos-documento
pub async fn create_tipo_documento<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Json(req): Json<CreateTipoDocumentoRequest>,
) -> CatalogResult<(StatusCode, Json<TipoDocumentoResponse>)>
where
    R: TipoDocumentoStore,
{
    let input = CreateTipoDocumentoInput {
        codigo: req.codigo,
        nombre: req.nombre,
        descripcion: req.descripcion,
        es_default: req.es_default,
    };
    let tipo = ManageTiposDocumentoUseCase::new(repo)
        .create(&actor, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(TipoDocumentoResponse::from(&tipo))))
}

/// PUT /api/v1/tipos-documento/{id}
pub async fn update_tipo_documento<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<TipoDocumentoId>,
    Json(req): Json<UpdateTipoDocumentoRequest>,
) -> CatalogResult<Json<TipoDocumentoResponse>>
where
    R: TipoDocumentoStore,
{
    let input = UpdateTipoDocumentoInput {
        codigo: req.codigo,
        nombre: req.nombre,
        descripcion: req.descripcion,
        es_default: req.es_default,
        esta_activo: req.esta_activo,
    };
    let tipo = ManageTiposDocumentoUseCase::new(repo)
        .update(&actor, id, input, Utc::now())
        .await?;
    Ok(Json(TipoDocumentoResponse::from(&tipo)))
}

/// DELETE /api/v1/tipos-documento/{id}
pub async fn delete_tipo_documento<R>(
    State(repo): State<Arc<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<TipoDocumentoId>,
) -> CatalogResult<StatusCode>
where
    R: TipoDocumentoStore,
{
    ManageTiposDocumentoUseCase::new(repo)
        .delete(&actor, id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
