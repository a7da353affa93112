//! Domain Layer
//!
//! Reference-data entities, code value objects and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;
