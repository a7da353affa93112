//! Shared kernel for the brokerage back office.
//!
//! Holds the vocabulary every feature crate agrees on:
//! - the unified [`AppError`](error::app_error::AppError) and its HTTP mapping
//! - typed numeric identifiers for persisted entities
//!
//! Anything specific to one slice (usuarios, monedas, ...) lives in that
//! slice's crate, not here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;

pub use error::app_error::{AppError, AppResult, FieldError};
pub use error::kind::ErrorKind;
