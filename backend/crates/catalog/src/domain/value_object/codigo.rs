//! Reference-data codes.
//!
//! Both are stored uppercased; lookups by code normalise the input the same
//! way, so `usd` finds `USD`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CatalogError, CatalogResult};

const DOCUMENTO_MAX_LENGTH: usize = 10;

/// ISO 4217 alphabetic code: exactly three ASCII letters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodigoMoneda(String);

impl CodigoMoneda {
    pub fn new(input: impl AsRef<str>) -> CatalogResult<Self> {
        let codigo = input.as_ref().trim().to_ascii_uppercase();
        if codigo.len() != 3 || !codigo.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CatalogError::invalid(
                "codigo",
                "Currency code must be exactly 3 letters (ISO 4217)",
            ));
        }
        Ok(Self(codigo))
    }

    pub fn from_db(codigo: impl Into<String>) -> Self {
        Self(codigo.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The only symbol accepted for currencies whose symbol is fixed
    pub fn required_simbolo(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "EUR" => Some("€"),
            _ => None,
        }
    }
}

impl TryFrom<String> for CodigoMoneda {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CodigoMoneda::new(value)
    }
}

impl From<CodigoMoneda> for String {
    fn from(value: CodigoMoneda) -> Self {
        value.0
    }
}

impl fmt::Display for CodigoMoneda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document type code such as `RUT` or `PASAPORTE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodigoDocumento(String);

impl CodigoDocumento {
    pub fn new(input: impl AsRef<str>) -> CatalogResult<Self> {
        let codigo = input.as_ref().trim().to_ascii_uppercase();
        if codigo.is_empty() || codigo.len() > DOCUMENTO_MAX_LENGTH {
            return Err(CatalogError::invalid(
                "codigo",
                format!("Code must be 1 to {DOCUMENTO_MAX_LENGTH} characters"),
            ));
        }
        if !codigo
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(CatalogError::invalid(
                "codigo",
                "Code may only contain letters, digits and underscores",
            ));
        }
        Ok(Self(codigo))
    }

    pub fn from_db(codigo: impl Into<String>) -> Self {
        Self(codigo.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CodigoDocumento {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CodigoDocumento::new(value)
    }
}

impl From<CodigoDocumento> for String {
    fn from(value: CodigoDocumento) -> Self {
        value.0
    }
}

impl fmt::Display for CodigoDocumento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
