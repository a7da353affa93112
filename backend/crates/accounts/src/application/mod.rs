//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod change_password;
pub mod config;
pub mod current_usuario;
pub mod delete_usuario;
pub mod query_usuarios;
pub mod register_usuario;
pub mod sign_in;
pub mod update_usuario;

// Re-exports
pub use authenticate::AuthenticationService;
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use config::AccountsConfig;
pub use current_usuario::CurrentUsuarioUseCase;
pub use delete_usuario::DeleteUsuarioUseCase;
pub use query_usuarios::QueryUsuariosUseCase;
pub use register_usuario::{RegisterUsuarioInput, RegisterUsuarioUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use update_usuario::{UpdateUsuarioInput, UpdateUsuarioUseCase};
