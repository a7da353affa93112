//! Domain Layer
//!
//! Entities, value objects, the lockout and permission rules, and the
//! repository traits the infrastructure layer implements.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;
