//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::sync::Arc;

use accounts::application::{RegisterUsuarioInput, RegisterUsuarioUseCase};
use accounts::domain::repository::UsuarioRepository;
use accounts::models::{Role, Username};
use accounts::{AccountsAppState, PgAccountsRepository, require_usuario, usuarios_router_generic};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use catalog::{PgCatalogRepository, monedas_router, seed_reference_data, tipos_documento_router};
use chrono::Utc;
use kernel::error::app_error::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{FirstSuperuser, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,accounts=info,catalog=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    let accounts_repo = PgAccountsRepository::new(pool.clone());
    if let Some(admin) = &settings.first_superuser {
        seed_first_superuser(&accounts_repo, &settings, admin).await?;
    }

    let catalog_repo = PgCatalogRepository::new(pool.clone());
    let report = seed_reference_data(&catalog_repo, &catalog_repo, Utc::now()).await?;
    tracing::info!(
        monedas_created = report.monedas_created,
        tipos_documento_created = report.tipos_documento_created,
        "Reference data seeded"
    );

    let app = build_router(&settings, pool)
        .layer(TraceLayer::new_for_http())
        .layer(cors(&settings.frontend_origins));

    // Start server
    tracing::info!("Listening on {}", settings.bind_addr);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_router(settings: &Settings, pool: PgPool) -> Router {
    let accounts_state = AccountsAppState::new(
        PgAccountsRepository::new(pool.clone()),
        settings.accounts.clone(),
    );
    let bearer = from_fn_with_state(
        accounts_state.clone(),
        require_usuario::<PgAccountsRepository>,
    );

    let catalog_repo = PgCatalogRepository::new(pool);
    let monedas = monedas_router(catalog_repo.clone(), &settings.catalog).route_layer(bearer.clone());
    let tipos_documento =
        tipos_documento_router(catalog_repo, &settings.catalog).route_layer(bearer);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/usuarios", usuarios_router_generic(accounts_state))
        .nest("/api/v1/monedas", monedas)
        .nest("/api/v1/tipos-documento", tipos_documento)
        .fallback(unknown_route)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Unmatched paths answer with the same problem body as every other error.
async fn unknown_route() -> AppError {
    AppError::not_found("No such endpoint")
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}

/// Create the bootstrap superuser unless the username already exists.
async fn seed_first_superuser(
    repo: &PgAccountsRepository,
    settings: &Settings,
    admin: &FirstSuperuser,
) -> anyhow::Result<()> {
    let username = Username::new(&admin.username)?;
    if repo.find_by_username(&username).await?.is_some() {
        tracing::debug!(username = %username, "First superuser already present");
        return Ok(());
    }

    let usecase = RegisterUsuarioUseCase::new(
        Arc::new(repo.clone()),
        settings.accounts.password_hasher(),
    );
    let usuario = usecase
        .execute(
            None,
            RegisterUsuarioInput {
                nombre: "Administrador".to_string(),
                apellido: "Sistema".to_string(),
                email: admin.email.clone(),
                username: admin.username.clone(),
                password: admin.password.clone(),
                is_enabled: true,
                is_superuser: true,
                role: Role::Admin,
                corredor_numero: None,
                comision_porcentaje: 0.0,
                telefono: None,
            },
            Utc::now(),
        )
        .await?;

    tracing::info!(usuario_id = %usuario.id, "First superuser created");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_unknown_route_is_problem_404() {
        let response = unknown_route().await.into_response();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
