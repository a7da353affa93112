//! Application Configuration
//!
//! Configuration for the accounts application layer.

use std::fmt;
use std::time::Duration;

use platform::password::PasswordHasher;
use platform::token::{TokenAlgorithm, TokenCodec};

use crate::domain::services::LockoutPolicy;

/// Seven days, matching the lifetime clients already expect
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Clone)]
pub struct AccountsConfig {
    /// HMAC secret for bearer tokens
    pub jwt_secret: Vec<u8>,
    pub jwt_algorithm: TokenAlgorithm,
    pub access_token_ttl: Duration,
    pub lockout: LockoutPolicy,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            jwt_algorithm: TokenAlgorithm::default(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            lockout: LockoutPolicy::default(),
            password_pepper: None,
        }
    }
}

impl AccountsConfig {
    /// Config with a random signing secret. Tokens do not survive a restart.
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            jwt_secret: secret,
            ..Default::default()
        }
    }

    /// Random secret and one-hour tokens.
    pub fn development() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(3600),
            ..Self::with_random_secret()
        }
    }

    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(&self.jwt_secret, self.jwt_algorithm, self.access_token_ttl)
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.password_pepper.clone())
    }
}

impl fmt::Debug for AccountsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountsConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("lockout", &self.lockout)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
