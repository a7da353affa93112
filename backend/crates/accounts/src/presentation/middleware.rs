//! Bearer-token authentication.
//!
//! [`require_usuario`] resolves the `Authorization: Bearer` header to a
//! usuario and stores it in the request extensions; handlers (in this crate
//! or any other) then take a [`CurrentUsuario`] argument.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use crate::application::CurrentUsuarioUseCase;
use crate::domain::entity::Usuario;
use crate::domain::repository::AccountsStore;
use crate::error::AccountsError;
use crate::presentation::handlers::AccountsAppState;

/// The authenticated usuario for this request
#[derive(Debug, Clone)]
pub struct CurrentUsuario(pub Usuario);

/// Middleware that rejects the request unless it carries a valid bearer
/// token for an enabled usuario.
pub async fn require_usuario<R>(
    State(state): State<AccountsAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AccountsError>
where
    R: AccountsStore,
{
    let token = bearer_token(req.headers()).ok_or(AccountsError::NotAuthenticated)?;

    let use_case = CurrentUsuarioUseCase::new(state.repo.clone(), state.tokens.clone());
    let usuario = use_case.execute(&token).await?;

    req.extensions_mut().insert(CurrentUsuario(usuario));
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

impl<S> FromRequestParts<S> for CurrentUsuario
where
    S: Send + Sync,
{
    type Rejection = AccountsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUsuario>()
            .cloned()
            .ok_or(AccountsError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
