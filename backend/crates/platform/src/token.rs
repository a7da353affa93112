//! Signed bearer tokens.
//!
//! HMAC-signed JWTs carrying the account id as subject. Expiry is the only
//! invalidation mechanism: there is no revocation list, so anything that must
//! take effect immediately (deactivation, deletion) is enforced by re-reading
//! the account on every request.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Value of the `type` claim on access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access_token";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token is not an access token")]
    WrongType,

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// HMAC algorithms accepted for signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl TokenAlgorithm {
    fn as_jwt(self) -> Algorithm {
        match self {
            TokenAlgorithm::Hs256 => Algorithm::HS256,
            TokenAlgorithm::Hs384 => Algorithm::HS384,
            TokenAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

impl FromStr for TokenAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(TokenAlgorithm::Hs256),
            "HS384" => Ok(TokenAlgorithm::Hs384),
            "HS512" => Ok(TokenAlgorithm::Hs512),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the account id, as a decimal string
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Freshly signed token plus its lifetime in seconds
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    algorithm: TokenAlgorithm,
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: TokenAlgorithm, ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: impl ToString, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_in = i64::try_from(self.ttl.as_secs())
            .map_err(|_| TokenError::Encoding("token lifetime out of range".into()))?;
        let iat = now.timestamp();
        let claims = AccessClaims {
            sub: subject.to_string(),
            iat,
            exp: iat + expires_in,
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(&Header::new(self.algorithm.as_jwt()), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, expires_in })
    }

    /// Check signature, expiry and token type.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm.as_jwt());
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<AccessClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(TokenError::WrongType);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            b"clave-de-prueba-suficientemente-larga",
            TokenAlgorithm::Hs256,
            Duration::from_secs(7 * 24 * 3600),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let issued = codec.issue(42, Utc::now()).unwrap();
        assert_eq!(issued.expires_in, 7 * 24 * 3600);

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, issued.expires_in);
        assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
    }

    #[test]
    fn test_each_token_has_unique_jti() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.verify(&codec.issue(1, now).unwrap().token).unwrap();
        let b = codec.verify(&codec.issue(1, now).unwrap().token).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let long_ago = Utc::now() - chrono::Duration::days(8);
        let issued = codec.issue(1, long_ago).unwrap();
        assert!(matches!(codec.verify(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = codec().issue(1, Utc::now()).unwrap();
        let other = TokenCodec::new(b"otra-clave", TokenAlgorithm::Hs256, Duration::from_secs(60));
        assert!(matches!(
            other.verify(&issued.token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            codec().verify("not.a.jwt"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("hs512".parse::<TokenAlgorithm>().unwrap(), TokenAlgorithm::Hs512);
        assert!("RS256".parse::<TokenAlgorithm>().is_err());
        assert!("none".parse::<TokenAlgorithm>().is_err());
    }
}
