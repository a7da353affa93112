pub mod credential;
pub mod usuario;

pub use credential::{Credential, LockoutState};
pub use usuario::{ProfileFields, Usuario, UsuarioProfile};
