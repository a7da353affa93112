pub mod lockout;
pub mod permissions;

pub use lockout::{LockCheck, LockStatus, LockoutPolicy};
