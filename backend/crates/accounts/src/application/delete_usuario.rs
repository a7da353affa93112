//! Delete Usuario Use Case

use std::sync::Arc;

use kernel::id::UsuarioId;

use crate::application::register_usuario::require;
use crate::domain::entity::Usuario;
use crate::domain::repository::UsuarioRepository;
use crate::domain::services::permissions::USUARIOS_WRITE;
use crate::error::{AccountsError, AccountsResult};

pub struct DeleteUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    usuarios: Arc<U>,
}

impl<U> DeleteUsuarioUseCase<U>
where
    U: UsuarioRepository,
{
    pub fn new(usuarios: Arc<U>) -> Self {
        Self { usuarios }
    }

    pub async fn execute(&self, actor: &Usuario, id: UsuarioId) -> AccountsResult<()> {
        require(actor, USUARIOS_WRITE)?;
        if actor.id == id {
            return Err(AccountsError::invalid("id", "cannot delete your own account"));
        }
        if !self.usuarios.delete(id).await? {
            return Err(AccountsError::UsuarioNotFound);
        }
        tracing::info!(usuario_id = %id, deleted_by = %actor.id, "Usuario deleted");
        Ok(())
    }
}
