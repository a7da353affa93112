//! Presentation Layer
//!
//! HTTP handlers, DTOs and routers. Authentication is applied by the caller
//! (see `accounts::require_usuario`); handlers read the actor through
//! [`accounts::CurrentUsuario`].

pub mod dto;
pub mod handlers;
pub mod router;
