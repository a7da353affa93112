//! Infrastructure Layer
//!
//! - `postgres`: sqlx-backed repositories
//! - `cached`: cache-aside decorators over any repository

pub mod cached;
pub mod postgres;
