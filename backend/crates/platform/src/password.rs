//! Password hashing adapter.
//!
//! New hashes are always Argon2id (PHC string). Hashes written by the previous
//! system are bcrypt and are still accepted for verification; callers detect
//! them with [`HashedPassword::is_legacy`] and replace them after a successful
//! login.
//!
//! The format is chosen from a closed set of tags ([`HashFormat`]), so an
//! unknown or corrupt hash can only ever fail verification.

use std::fmt;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _, password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Rejection of a new password (registration or password change)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Cannot hash an empty password")]
    Empty,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Hashing task did not complete: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Hash format
// ============================================================================

/// Known hash algorithms, identified by the tag at the start of the hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    /// `$argon2id$...` - what [`PasswordHasher::hash`] produces
    Argon2id,
    /// `$2a$`, `$2b$` or `$2y$` - accepted for verification only
    Bcrypt,
}

impl HashFormat {
    /// Format used for every newly produced hash
    pub const CURRENT: HashFormat = HashFormat::Argon2id;

    const TAGS: &'static [(&'static str, HashFormat)] = &[
        ("$argon2id$", HashFormat::Argon2id),
        ("$2b$", HashFormat::Bcrypt),
        ("$2a$", HashFormat::Bcrypt),
        ("$2y$", HashFormat::Bcrypt),
    ];

    /// Identify the algorithm behind a stored hash, `None` if unrecognised.
    pub fn detect(hash: &str) -> Option<Self> {
        Self::TAGS
            .iter()
            .find(|(tag, _)| hash.starts_with(tag))
            .map(|(_, format)| *format)
    }

    #[inline]
    pub const fn is_legacy(self) -> bool {
        !matches!(self, HashFormat::Argon2id)
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Plaintext password, zeroized when dropped
///
/// Two constructors: [`ClearTextPassword::new`] enforces the password policy
/// and is used when a password is being set; [`ClearTextPassword::submitted`]
/// accepts whatever the client sent and is only ever verified against a hash.
///
/// Argon2id hashes are computed over the NFKC form. Legacy bcrypt hashes were
/// computed over the bytes exactly as typed, so those are kept too.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword {
    normalized: String,
    raw: String,
}

impl ClearTextPassword {
    /// Validate a password that is about to be stored.
    pub fn new(raw: impl Into<String>) -> Result<Self, PasswordPolicyError> {
        let password = Self::submitted(raw);
        password.check_policy()?;
        Ok(password)
    }

    /// Wrap a login attempt without applying the policy.
    pub fn submitted(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = raw.nfkc().collect();
        Self { normalized, raw }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.normalized.as_bytes()
    }

    pub(crate) fn raw_bytes(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    fn check_policy(&self) -> Result<(), PasswordPolicyError> {
        if self.normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let actual = self.normalized.chars().count();
        if actual < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual,
            });
        }
        if actual > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual,
            });
        }

        if self
            .normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&self.normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(())
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password
// ============================================================================

/// A stored password hash of any known (or unknown) format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a hash loaded from storage. No validation: an unparseable value
    /// simply never verifies.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn format(&self) -> Option<HashFormat> {
        HashFormat::detect(&self.0)
    }

    /// True when the hash should be replaced by a modern one after the next
    /// successful verification.
    pub fn is_legacy(&self) -> bool {
        self.format().is_some_and(HashFormat::is_legacy)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HashedPassword")
            .field(&self.format())
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Argon2id hasher with bcrypt fallback on verify
///
/// The pepper only applies to Argon2id hashes; bcrypt hashes were written
/// without one.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    pepper: Option<Arc<[u8]>>,
}

impl PasswordHasher {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            pepper: pepper.filter(|p| !p.is_empty()).map(Arc::from),
        }
    }

    fn peppered(&self, password: &ClearTextPassword) -> zeroize::Zeroizing<Vec<u8>> {
        let mut bytes = password.as_bytes().to_vec();
        if let Some(pepper) = &self.pepper {
            bytes.extend_from_slice(pepper);
        }
        zeroize::Zeroizing::new(bytes)
    }

    /// Produce a fresh Argon2id hash.
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        if password.is_empty() {
            return Err(PasswordHashError::Empty);
        }

        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(&self.peppered(password), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword(hash.to_string()))
    }

    /// Check a password against a stored hash. Mismatch, unknown format and
    /// corrupt hashes all yield `false`.
    pub fn verify(&self, password: &ClearTextPassword, stored: &HashedPassword) -> bool {
        match stored.format() {
            Some(HashFormat::Argon2id) => {
                let Ok(parsed) = PasswordHash::new(stored.as_str()) else {
                    return false;
                };
                Argon2::default()
                    .verify_password(&self.peppered(password), &parsed)
                    .is_ok()
            }
            Some(HashFormat::Bcrypt) => {
                bcrypt::verify(password.raw_bytes(), stored.as_str()).unwrap_or(false)
            }
            None => false,
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(
        &self,
        password: ClearTextPassword,
    ) -> Result<HashedPassword, PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool. The password is handed
    /// back so the caller can re-hash it when the stored hash is legacy.
    pub async fn verify_blocking(
        &self,
        password: ClearTextPassword,
        stored: HashedPassword,
    ) -> Result<(bool, ClearTextPassword), PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let ok = hasher.verify(&password, &stored);
            (ok, password)
        })
        .await
        .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("peppered", &self.pepper.is_some())
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "contrasena",
        "contraseña",
        "abcdefgh",
        "admin123",
        "changeme",
        "letmein",
        "welcome",
        "bienvenido",
        "iloveyou",
        "teamo123",
    ];
    COMMON_PASSWORDS.contains(&lower.as_str())
}

fn is_sequential_numbers(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));
    let descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    ascending || descending
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the legacy fixtures fast.
    fn legacy_hash(plain: &str) -> HashedPassword {
        HashedPassword::from_stored(bcrypt::hash(plain, 4).unwrap())
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(
            HashFormat::detect("$argon2id$v=19$m=19456,t=2,p=1$abc$def"),
            Some(HashFormat::Argon2id)
        );
        assert_eq!(HashFormat::detect("$2b$12$abc"), Some(HashFormat::Bcrypt));
        assert_eq!(HashFormat::detect("$2a$10$abc"), Some(HashFormat::Bcrypt));
        assert_eq!(HashFormat::detect("$2y$10$abc"), Some(HashFormat::Bcrypt));
        assert_eq!(HashFormat::detect("$argon2i$v=19$..."), None);
        assert_eq!(HashFormat::detect("plaintext"), None);
        assert_eq!(HashFormat::detect(""), None);
    }

    #[test]
    fn test_hash_is_always_modern() {
        let hasher = PasswordHasher::default();
        let hashed = hasher
            .hash(&ClearTextPassword::submitted("Poliza#2024seguro"))
            .unwrap();
        assert!(hashed.as_str().starts_with("$argon2id$"));
        assert_eq!(hashed.format(), Some(HashFormat::CURRENT));
        assert!(!hashed.is_legacy());
    }

    #[test]
    fn test_hash_rejects_empty() {
        let hasher = PasswordHasher::default();
        let result = hasher.hash(&ClearTextPassword::submitted(""));
        assert!(matches!(result, Err(PasswordHashError::Empty)));
    }

    #[test]
    fn test_verify_modern() {
        let hasher = PasswordHasher::default();
        let stored = hasher
            .hash(&ClearTextPassword::submitted("Poliza#2024seguro"))
            .unwrap();
        assert!(hasher.verify(&ClearTextPassword::submitted("Poliza#2024seguro"), &stored));
        assert!(!hasher.verify(&ClearTextPassword::submitted("poliza#2024seguro"), &stored));
    }

    #[test]
    fn test_verify_legacy_bcrypt() {
        let hasher = PasswordHasher::default();
        let stored = legacy_hash("clave-antigua-99");
        assert!(stored.is_legacy());
        assert!(stored.as_str().starts_with("$2b$"));
        assert!(hasher.verify(&ClearTextPassword::submitted("clave-antigua-99"), &stored));
        assert!(!hasher.verify(&ClearTextPassword::submitted("clave-antigua-98"), &stored));
    }

    #[test]
    fn test_legacy_bcrypt_uses_bytes_as_typed() {
        let hasher = PasswordHasher::default();
        // Decomposed accent, as some keyboards send it.
        let typed = "cafe\u{301}-seguro-99";
        let stored = legacy_hash(typed);

        assert!(hasher.verify(&ClearTextPassword::submitted(typed), &stored));
        assert!(!hasher.verify(&ClearTextPassword::submitted("caf\u{e9}-seguro-99"), &stored));
    }

    #[test]
    fn test_modern_hash_ignores_normalization_form() {
        let hasher = PasswordHasher::default();
        let stored = hasher
            .hash(&ClearTextPassword::submitted("cafe\u{301}-seguro-99"))
            .unwrap();
        assert!(hasher.verify(&ClearTextPassword::submitted("caf\u{e9}-seguro-99"), &stored));
        assert!(hasher.verify(&ClearTextPassword::submitted("cafe\u{301}-seguro-99"), &stored));
    }

    #[test]
    fn test_pepper_does_not_affect_bcrypt() {
        let hasher = PasswordHasher::new(Some(b"pimienta".to_vec()));
        let stored = legacy_hash("clave-antigua-99");
        assert!(hasher.verify(&ClearTextPassword::submitted("clave-antigua-99"), &stored));
    }

    #[test]
    fn test_pepper_must_match_for_argon2() {
        let peppered = PasswordHasher::new(Some(b"pimienta".to_vec()));
        let plain = PasswordHasher::default();
        let stored = peppered
            .hash(&ClearTextPassword::submitted("Poliza#2024seguro"))
            .unwrap();
        assert!(peppered.verify(&ClearTextPassword::submitted("Poliza#2024seguro"), &stored));
        assert!(!plain.verify(&ClearTextPassword::submitted("Poliza#2024seguro"), &stored));
    }

    #[test]
    fn test_unknown_or_corrupt_hash_never_verifies() {
        let hasher = PasswordHasher::default();
        let pw = ClearTextPassword::submitted("whatever-123");
        assert!(!hasher.verify(&pw, &HashedPassword::from_stored("")));
        assert!(!hasher.verify(&pw, &HashedPassword::from_stored("whatever-123")));
        assert!(!hasher.verify(&pw, &HashedPassword::from_stored("$argon2id$garbage")));
        assert!(!hasher.verify(&pw, &HashedPassword::from_stored("$2b$12$short")));
    }

    #[test]
    fn test_policy() {
        assert!(matches!(
            ClearTextPassword::new("short"),
            Err(PasswordPolicyError::TooShort { .. })
        ));
        assert!(matches!(
            ClearTextPassword::new("a".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
        assert!(matches!(
            ClearTextPassword::new("          "),
            Err(PasswordPolicyError::EmptyOrWhitespace)
        ));
        assert!(matches!(
            ClearTextPassword::new("password123"),
            Err(PasswordPolicyError::CommonPattern)
        ));
        assert!(matches!(
            ClearTextPassword::new("12345678"),
            Err(PasswordPolicyError::CommonPattern)
        ));
        assert!(ClearTextPassword::new("Corredor#Seguros7").is_ok());
    }

    #[test]
    fn test_submitted_skips_policy() {
        assert!(!ClearTextPassword::submitted("x").is_empty());
        assert!(ClearTextPassword::submitted("").is_empty());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::submitted("secreto-total");
        let output = format!("{:?}", password);
        assert!(output.contains("REDACTED"));
        assert!(!output.contains("secreto"));

        let hashed = legacy_hash("secreto-total");
        assert!(!format!("{:?}", hashed).contains("$2b$"));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = PasswordHasher::default();
        let stored = hasher
            .hash_blocking(ClearTextPassword::submitted("Poliza#2024seguro"))
            .await
            .unwrap();
        let (ok, _pw) = hasher
            .verify_blocking(ClearTextPassword::submitted("Poliza#2024seguro"), stored)
            .await
            .unwrap();
        assert!(ok);
    }
}
