//! Username value object.
//!
//! Case is preserved for display; uniqueness and login lookups use the
//! lowercase canonical form.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AccountsError, AccountsResult};

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username {
    original: String,
    canonical: String,
}

impl Username {
    pub fn new(input: impl AsRef<str>) -> AccountsResult<Self> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();

        let length = original.chars().count();
        if length < USERNAME_MIN_LENGTH {
            return Err(AccountsError::invalid(
                "username",
                format!("must be at least {USERNAME_MIN_LENGTH} characters"),
            ));
        }
        if length > USERNAME_MAX_LENGTH {
            return Err(AccountsError::invalid(
                "username",
                format!("must be at most {USERNAME_MAX_LENGTH} characters"),
            ));
        }
        if let Some(bad) = original
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(AccountsError::invalid(
                "username",
                format!("invalid character '{bad}'"),
            ));
        }

        let canonical = original.to_lowercase();
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Key for a login lookup. Only canonicalizes: rows created before the
    /// character rules existed must still be reachable.
    pub fn lookup(input: impl AsRef<str>) -> Option<Self> {
        let original = input.as_ref().nfkc().collect::<String>().trim().to_string();
        if original.is_empty() {
            return None;
        }
        Some(Self::from_db(original))
    }

    /// Rebuild from a stored row.
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_lowercase();
        Self {
            original,
            canonical,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl TryFrom<String> for Username {
    type Error = AccountsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Username::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.original
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(Username::new("jdoe").is_ok());
        assert!(Username::new("maria.gonzalez").is_ok());
        assert!(Username::new("corredor_17").is_ok());
    }

    #[test]
    fn test_lookup_skips_character_rules() {
        assert!(Username::new("jos\u{e9}.p\u{e9}rez").is_err());
        let key = Username::lookup("  Jos\u{e9}.P\u{e9}rez ").unwrap();
        assert_eq!(key.canonical(), "jos\u{e9}.p\u{e9}rez");
        assert_eq!(
            Username::lookup("jose\u{301}.pe\u{301}rez").unwrap().canonical(),
            Username::from_db("jos\u{e9}.p\u{e9}rez").canonical()
        );
        assert!(Username::lookup("   ").is_none());
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(Username::new("jd").is_err());
        assert!(Username::new("   ").is_err());
        assert!(Username::new("j doe").is_err());
        assert!(Username::new("jdoe@mail").is_err());
        assert!(Username::new("a".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_canonical_is_lowercase() {
        let name = Username::new("  JDoe ").unwrap();
        assert_eq!(name.as_str(), "JDoe");
        assert_eq!(name.canonical(), "jdoe");
    }
}
