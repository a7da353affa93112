//! Platform crate: technical building blocks with no brokerage knowledge.
//!
//! - Password hashing (Argon2id, legacy bcrypt verification)
//! - Cache-aside TTL cache for reference data
//! - Signed bearer tokens

pub mod cache;
pub mod password;
pub mod token;
