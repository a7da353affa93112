//! Sign In Use Case
//!
//! Authenticates a usuario and issues a bearer token.

use chrono::{DateTime, Utc};
use platform::token::TokenCodec;

use crate::application::authenticate::AuthenticationService;
use crate::domain::entity::Usuario;
use crate::domain::repository::AccountsStore;
use crate::error::AccountsResult;

pub struct SignInInput {
    pub username: String,
    pub password: String,
}

pub struct SignInOutput {
    pub access_token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub usuario: Usuario,
}

pub struct SignInUseCase<S>
where
    S: AccountsStore,
{
    auth: AuthenticationService<S>,
    tokens: TokenCodec,
}

impl<S> SignInUseCase<S>
where
    S: AccountsStore,
{
    pub fn new(auth: AuthenticationService<S>, tokens: TokenCodec) -> Self {
        Self { auth, tokens }
    }

    pub async fn execute(&self, input: SignInInput, now: DateTime<Utc>) -> AccountsResult<SignInOutput> {
        let usuario = self
            .auth
            .authenticate(&input.username, input.password, now)
            .await?;

        let issued = self.tokens.issue(usuario.id, now)?;

        tracing::info!(usuario_id = %usuario.id, role = %usuario.role(), "Usuario signed in");

        Ok(SignInOutput {
            access_token: issued.token,
            expires_in: issued.expires_in,
            usuario,
        })
    }
}
