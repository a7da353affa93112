//! Current Usuario Use Case
//!
//! Resolves a bearer token to the usuario it was issued for. The account is
//! re-read on every call, so deactivation and deletion take effect before the
//! token expires.

use std::sync::Arc;

use kernel::id::UsuarioId;
use platform::token::TokenCodec;

use crate::domain::entity::Usuario;
use crate::domain::repository::UsuarioRepository;
use crate::error::{AccountsError, AccountsResult};

pub struct CurrentUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    usuarios: Arc<U>,
    tokens: TokenCodec,
}

impl<U> CurrentUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    pub fn new(usuarios: Arc<U>, tokens: TokenCodec) -> Self {
        Self { usuarios, tokens }
    }

    pub async fn execute(&self, bearer_token: &str) -> AccountsResult<Usuario> {
        let claims = self.tokens.verify(bearer_token)?;
        let id: UsuarioId = claims
            .sub
            .parse()
            .map_err(|_| AccountsError::NotAuthenticated)?;

        let usuario = self
            .usuarios
            .find_by_id(id)
            .await?
            .ok_or(AccountsError::NotAuthenticated)?;

        if !usuario.can_authenticate() {
            return Err(AccountsError::AccountDisabled);
        }
        Ok(usuario)
    }
}
