pub mod email;
pub mod role;
pub mod username;

pub use email::Email;
pub use role::Role;
pub use username::Username;
