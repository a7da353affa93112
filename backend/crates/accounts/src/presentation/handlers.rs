//! HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use chrono::Utc;
use kernel::id::UsuarioId;
use platform::password::PasswordHasher;
use platform::token::TokenCodec;
use std::sync::Arc;

use crate::application::{
    AccountsConfig, AuthenticationService, ChangePasswordInput, ChangePasswordUseCase,
    DeleteUsuarioUseCase, QueryUsuariosUseCase, RegisterUsuarioInput, RegisterUsuarioUseCase,
    SignInInput, SignInUseCase, UpdateUsuarioInput, UpdateUsuarioUseCase,
};
use crate::domain::repository::AccountsStore;
use crate::error::AccountsResult;
use crate::presentation::dto::{
    ChangePasswordRequest, ListQuery, LoginForm, MessageResponse, RegisterUsuarioRequest,
    TokenResponse, UpdateUsuarioRequest, UsuarioResponse,
};
use crate::presentation::middleware::CurrentUsuario;

/// Shared state for usuario handlers and the bearer middleware
pub struct AccountsAppState<R>
where
    R: AccountsStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AccountsConfig>,
    pub tokens: TokenCodec,
    pub hasher: PasswordHasher,
}

impl<R> AccountsAppState<R>
where
    R: AccountsStore,
{
    pub fn new(repo: R, config: AccountsConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            tokens: config.token_codec(),
            hasher: config.password_hasher(),
            config: Arc::new(config),
        }
    }

    fn authentication(&self) -> AuthenticationService<R> {
        AuthenticationService::new(self.repo.clone(), self.hasher.clone(), self.config.lockout)
    }
}

impl<R> Clone for AccountsAppState<R>
where
    R: AccountsStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/v1/usuarios/login
pub async fn login<R>(
    State(state): State<AccountsAppState<R>>,
    Form(form): Form<LoginForm>,
) -> AccountsResult<Json<TokenResponse>>
where
    R: AccountsStore,
{
    let use_case = SignInUseCase::new(state.authentication(), state.tokens.clone());

    let output = use_case
        .execute(
            SignInInput {
                username: form.username,
                password: form.password,
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(TokenResponse {
        access_token: output.access_token,
        token_type: "bearer",
        expires_in: output.expires_in,
        usuario: output.usuario.into(),
    }))
}

// ============================================================================
// Usuario management
// ============================================================================

/// POST /api/v1/usuarios
pub async fn register_usuario<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Json(req): Json<RegisterUsuarioRequest>,
) -> AccountsResult<(StatusCode, Json<UsuarioResponse>)>
where
    R: AccountsStore,
{
    let use_case = RegisterUsuarioUseCase::new(state.repo.clone(), state.hasher.clone());

    let input = RegisterUsuarioInput {
        nombre: req.nombre,
        apellido: req.apellido,
        email: req.email,
        username: req.username,
        password: req.password,
        is_enabled: req.is_active,
        is_superuser: req.is_superuser,
        role: req.role,
        corredor_numero: req.corredor_numero,
        comision_porcentaje: req.comision_porcentaje.unwrap_or(0.0),
        telefono: req.telefono,
    };

    let usuario = use_case.execute(Some(&actor), input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(usuario.into())))
}

/// GET /api/v1/usuarios
pub async fn list_usuarios<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Query(query): Query<ListQuery>,
) -> AccountsResult<Json<Vec<UsuarioResponse>>>
where
    R: AccountsStore,
{
    let usuarios = QueryUsuariosUseCase::new(state.repo.clone())
        .list(&actor, query.skip, query.limit)
        .await?;
    Ok(Json(usuarios.iter().map(UsuarioResponse::from).collect()))
}

/// GET /api/v1/usuarios/corredor/{corredor_numero}
pub async fn list_usuarios_by_corredor<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(corredor_numero): Path<i64>,
) -> AccountsResult<Json<Vec<UsuarioResponse>>>
where
    R: AccountsStore,
{
    let usuarios = QueryUsuariosUseCase::new(state.repo.clone())
        .list_by_corredor(&actor, corredor_numero)
        .await?;
    Ok(Json(usuarios.iter().map(UsuarioResponse::from).collect()))
}

/// GET /api/v1/usuarios/me
pub async fn me(CurrentUsuario(actor): CurrentUsuario) -> Json<UsuarioResponse> {
    Json(actor.into())
}

/// GET /api/v1/usuarios/{id}
pub async fn get_usuario<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<UsuarioId>,
) -> AccountsResult<Json<UsuarioResponse>>
where
    R: AccountsStore,
{
    let usuario = QueryUsuariosUseCase::new(state.repo.clone())
        .get_by_id(&actor, id)
        .await?;
    Ok(Json(usuario.into()))
}

/// GET /api/v1/usuarios/username/{username}
pub async fn get_usuario_by_username<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(username): Path<String>,
) -> AccountsResult<Json<UsuarioResponse>>
where
    R: AccountsStore,
{
    let usuario = QueryUsuariosUseCase::new(state.repo.clone())
        .get_by_username(&actor, &username)
        .await?;
    Ok(Json(usuario.into()))
}

/// PUT /api/v1/usuarios/{id}
pub async fn update_usuario<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<UsuarioId>,
    Json(req): Json<UpdateUsuarioRequest>,
) -> AccountsResult<Json<UsuarioResponse>>
where
    R: AccountsStore,
{
    let input = UpdateUsuarioInput {
        nombre: req.nombre,
        apellido: req.apellido,
        email: req.email,
        username: req.username,
        is_enabled: req.is_active,
        is_superuser: req.is_superuser,
        role: req.role,
        corredor_numero: req.corredor_numero,
        comision_porcentaje: req.comision_porcentaje,
        telefono: req.telefono,
    };

    let usuario = UpdateUsuarioUseCase::new(state.repo.clone())
        .execute(&actor, id, input, Utc::now())
        .await?;
    Ok(Json(usuario.into()))
}

/// DELETE /api/v1/usuarios/{id}
pub async fn delete_usuario<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Path(id): Path<UsuarioId>,
) -> AccountsResult<StatusCode>
where
    R: AccountsStore,
{
    DeleteUsuarioUseCase::new(state.repo.clone())
        .execute(&actor, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/usuarios/cambiar-contrasena
pub async fn change_password<R>(
    State(state): State<AccountsAppState<R>>,
    CurrentUsuario(actor): CurrentUsuario,
    Json(req): Json<ChangePasswordRequest>,
) -> AccountsResult<Json<MessageResponse>>
where
    R: AccountsStore,
{
    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.hasher.clone());

    use_case
        .execute(
            &actor,
            ChangePasswordInput {
                usuario_id: req.usuario_id,
                current_password: req.contrasena_actual,
                new_password: req.nueva_contrasena,
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}
