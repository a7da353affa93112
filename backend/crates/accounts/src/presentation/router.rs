//! Usuarios Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::config::AccountsConfig;
use crate::domain::repository::AccountsStore;
use crate::infra::postgres::PgAccountsRepository;
use crate::presentation::handlers::{self, AccountsAppState};
use crate::presentation::middleware::require_usuario;

/// Create the usuarios router with the PostgreSQL repository
pub fn usuarios_router(repo: PgAccountsRepository, config: AccountsConfig) -> Router {
    usuarios_router_generic(AccountsAppState::new(repo, config))
}

/// Create the usuarios router for any repository implementation
///
/// `/login` is public; every other route requires a bearer token.
pub fn usuarios_router_generic<R>(state: AccountsAppState<R>) -> Router
where
    R: AccountsStore,
{
    let protected = Router::new()
        .route(
            "/",
            post(handlers::register_usuario::<R>).get(handlers::list_usuarios::<R>),
        )
        .route(
            "/corredor/{corredor_numero}",
            get(handlers::list_usuarios_by_corredor::<R>),
        )
        .route(
            "/username/{username}",
            get(handlers::get_usuario_by_username::<R>),
        )
        .route("/me", get(handlers::me))
        .route(
            "/{id}",
            get(handlers::get_usuario::<R>)
                .put(handlers::update_usuario::<R>)
                .delete(handlers::delete_usuario::<R>),
        )
        .route("/cambiar-contrasena", post(handlers::change_password::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_usuario::<R>,
        ));

    Router::new()
        .route("/login", post(handlers::login::<R>))
        .merge(protected)
        .with_state(state)
}
