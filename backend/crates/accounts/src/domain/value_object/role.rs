use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AccountsError;

/// Coarse authorization class of a usuario
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("corredor")]
    Corredor,
    #[display("asistente")]
    Asistente,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Corredor, Role::Asistente];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Corredor => "corredor",
            Role::Asistente => "asistente",
        }
    }

    /// A corredor account must be linked to a broker number.
    #[inline]
    pub const fn requires_corredor_numero(&self) -> bool {
        matches!(self, Role::Corredor)
    }
}

impl FromStr for Role {
    type Err = AccountsError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.code().eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| AccountsError::invalid("role", format!("Unknown role '{code}'")))
    }
}
