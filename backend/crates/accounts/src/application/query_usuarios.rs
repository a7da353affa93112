//! Usuario queries: by id, by username, paged listing, by corredor.

use std::sync::Arc;

use kernel::id::UsuarioId;

use crate::application::register_usuario::require;
use crate::domain::entity::Usuario;
use crate::domain::repository::UsuarioRepository;
use crate::domain::services::permissions::USUARIOS_READ;
use crate::domain::value_object::Username;
use crate::error::{AccountsError, AccountsResult};

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 500;

pub struct QueryUsuariosUseCase<U>
where
    U: UsuarioRepository,
{
    usuarios: Arc<U>,
}

impl<U> QueryUsuariosUseCase<U>
where
    U: UsuarioRepository,
{
    pub fn new(usuarios: Arc<U>) -> Self {
        Self { usuarios }
    }

    pub async fn get_by_id(&self, actor: &Usuario, id: UsuarioId) -> AccountsResult<Usuario> {
        if actor.id != id {
            require(actor, USUARIOS_READ)?;
        }
        self.usuarios
            .find_by_id(id)
            .await?
            .ok_or(AccountsError::UsuarioNotFound)
    }

    pub async fn get_by_username(&self, actor: &Usuario, username: &str) -> AccountsResult<Usuario> {
        require(actor, USUARIOS_READ)?;
        let username = Username::lookup(username).ok_or(AccountsError::UsuarioNotFound)?;
        self.usuarios
            .find_by_username(&username)
            .await?
            .ok_or(AccountsError::UsuarioNotFound)
    }

    pub async fn list(&self, actor: &Usuario, skip: i64, limit: i64) -> AccountsResult<Vec<Usuario>> {
        require(actor, USUARIOS_READ)?;
        if skip < 0 {
            return Err(AccountsError::invalid("skip", "must not be negative"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AccountsError::invalid(
                "limit",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        self.usuarios.list(skip, limit).await
    }

    pub async fn list_by_corredor(
        &self,
        actor: &Usuario,
        corredor_numero: i64,
    ) -> AccountsResult<Vec<Usuario>> {
        require(actor, USUARIOS_READ)?;
        self.usuarios.list_by_corredor(corredor_numero).await
    }
}
