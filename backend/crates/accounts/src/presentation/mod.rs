//! Presentation Layer
//!
//! HTTP handlers, DTOs, bearer-token middleware and router.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
