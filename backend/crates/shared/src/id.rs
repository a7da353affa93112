//! Typed numeric identifiers.
//!
//! Every table in the back office uses a `BIGSERIAL` primary key. Wrapping the
//! raw `i64` in [`Id<T>`] keeps a usuario id from being passed where a moneda
//! id is expected.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generic typed ID wrapper
///
/// ```
/// use kernel::id::{Id, markers};
/// type UsuarioId = Id<markers::Usuario>;
///
/// let id = UsuarioId::new(7);
/// assert_eq!(id.get(), 7);
/// ```
pub struct Id<T> {
    value: i64,
    _marker: PhantomData<fn() -> T>,
}

/// Error returned when a path segment or token subject is not a valid id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("identifier is not a number")]
    NotANumber,
    #[error("identifier must be positive, got {0}")]
    NotPositive(i64),
}

impl<T> Id<T> {
    /// Wrap an existing database key
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Raw key, for binding into queries
    #[inline]
    pub const fn get(&self) -> i64 {
        self.value
    }
}

// Manual impls so `T` does not need to implement these traits itself.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| IdParseError::NotANumber)?;
        if value <= 0 {
            return Err(IdParseError::NotPositive(value));
        }
        Ok(Self::new(value))
    }
}

impl<T> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T> From<Id<T>> for i64 {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

/// Marker types for different entity IDs
pub mod markers {
    /// Marker for usuario (user account) IDs
    pub struct Usuario;

    /// Marker for moneda (currency) IDs
    pub struct Moneda;

    /// Marker for tipo de documento IDs
    pub struct TipoDocumento;
}

pub type UsuarioId = Id<markers::Usuario>;
pub type MonedaId = Id<markers::Moneda>;
pub type TipoDocumentoId = Id<markers::TipoDocumento>;
