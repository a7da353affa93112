//! Usuario entity.
//!
//! The account profile. Credentials and lockout counters live in
//! [`Credential`](super::credential::Credential) and never travel with it.

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;

use crate::domain::services::permissions;
use crate::domain::value_object::{Email, Role, Username};
use crate::error::{AccountsError, AccountsResult};

/// Profile data shared by new and persisted usuarios
///
/// `role` and `corredor_numero` are only reachable through
/// [`assign_role`](Self::assign_role) so a corredor can never lose its broker
/// number.
#[derive(Debug, Clone, PartialEq)]
pub struct UsuarioProfile {
    pub nombre: String,
    pub apellido: String,
    pub email: Email,
    pub username: Username,
    pub is_enabled: bool,
    pub is_superuser: bool,
    role: Role,
    corredor_numero: Option<i64>,
    comision_porcentaje: f64,
    pub telefono: Option<String>,
}

/// Input for [`UsuarioProfile::new`]
#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub nombre: String,
    pub apellido: String,
    pub email: Email,
    pub username: Username,
    pub is_enabled: bool,
    pub is_superuser: bool,
    pub role: Role,
    pub corredor_numero: Option<i64>,
    pub comision_porcentaje: f64,
    pub telefono: Option<String>,
}

impl UsuarioProfile {
    pub fn new(fields: ProfileFields) -> AccountsResult<Self> {
        let mut profile = Self {
            nombre: validate_name("nombre", fields.nombre)?,
            apellido: validate_name("apellido", fields.apellido)?,
            email: fields.email,
            username: fields.username,
            is_enabled: fields.is_enabled,
            is_superuser: fields.is_superuser,
            role: fields.role,
            corredor_numero: None,
            comision_porcentaje: 0.0,
            telefono: validate_telefono(fields.telefono)?,
        };
        profile.assign_role(fields.role, fields.corredor_numero)?;
        profile.set_comision(fields.comision_porcentaje)?;
        Ok(profile)
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn corredor_numero(&self) -> Option<i64> {
        self.corredor_numero
    }

    #[inline]
    pub fn comision_porcentaje(&self) -> f64 {
        self.comision_porcentaje
    }

    /// Change role and broker association together.
    pub fn assign_role(&mut self, role: Role, corredor_numero: Option<i64>) -> AccountsResult<()> {
        if role.requires_corredor_numero() && corredor_numero.is_none() {
            return Err(AccountsError::invalid(
                "corredor_numero",
                format!("a usuario with role {role} must be linked to a corredor"),
            ));
        }
        if let Some(numero) = corredor_numero {
            if numero <= 0 {
                return Err(AccountsError::invalid(
                    "corredor_numero",
                    "must be a positive number",
                ));
            }
        }
        self.role = role;
        self.corredor_numero = corredor_numero;
        Ok(())
    }

    pub fn set_comision(&mut self, porcentaje: f64) -> AccountsResult<()> {
        if !(0.0..=100.0).contains(&porcentaje) {
            return Err(AccountsError::invalid(
                "comision_porcentaje",
                "must be between 0 and 100",
            ));
        }
        self.comision_porcentaje = porcentaje;
        Ok(())
    }

    pub fn set_nombre(&mut self, nombre: String) -> AccountsResult<()> {
        self.nombre = validate_name("nombre", nombre)?;
        Ok(())
    }

    pub fn set_apellido(&mut self, apellido: String) -> AccountsResult<()> {
        self.apellido = validate_name("apellido", apellido)?;
        Ok(())
    }

    pub fn set_telefono(&mut self, telefono: Option<String>) -> AccountsResult<()> {
        self.telefono = validate_telefono(telefono)?;
        Ok(())
    }
}

/// A persisted usuario
#[derive(Debug, Clone, PartialEq)]
pub struct Usuario {
    pub id: UsuarioId,
    pub profile: UsuarioProfile,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl Usuario {
    /// Whether this account may log in at all. Distinct from lockout, which
    /// is temporary and tracked on the credential.
    #[inline]
    pub fn can_authenticate(&self) -> bool {
        self.profile.is_enabled
    }

    #[inline]
    pub fn is_superuser(&self) -> bool {
        self.profile.is_superuser
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Disabled accounts have no permissions, superusers have all of them,
    /// everyone else goes through the role table.
    pub fn has_permission(&self, permission: &str) -> bool {
        if !self.profile.is_enabled {
            return false;
        }
        self.profile.is_superuser || permissions::has_permission(self.profile.role(), permission)
    }
}

const NAME_MAX_LENGTH: usize = 64;
const TELEFONO_MAX_LENGTH: usize = 20;

fn validate_name(field: &'static str, value: String) -> AccountsResult<String> {
    let value = value.trim().to_string();
    let len = value.chars().count();
    if len == 0 || len > NAME_MAX_LENGTH {
        return Err(AccountsError::invalid(
            field,
            format!("must be between 1 and {NAME_MAX_LENGTH} characters"),
        ));
    }
    Ok(value)
}

fn validate_telefono(value: Option<String>) -> AccountsResult<Option<String>> {
    match value.map(|t| t.trim().to_string()) {
        Some(t) if t.is_empty() => Ok(None),
        Some(t) if t.chars().count() > TELEFONO_MAX_LENGTH => Err(AccountsError::invalid(
            "telefono",
            format!("must be at most {TELEFONO_MAX_LENGTH} characters"),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn fields(username: &str, role: Role, corredor_numero: Option<i64>) -> ProfileFields {
        ProfileFields {
            nombre: "Juan".into(),
            apellido: "Doe".into(),
            email: Email::new(format!("{username}@seguros.cl")).unwrap(),
            username: Username::new(username).unwrap(),
            is_enabled: true,
            is_superuser: false,
            role,
            corredor_numero,
            comision_porcentaje: 0.0,
            telefono: None,
        }
    }

    pub fn usuario(id: i64, username: &str, role: Role, corredor_numero: Option<i64>) -> Usuario {
        let now = Utc::now();
        Usuario {
            id: UsuarioId::new(id),
            profile: UsuarioProfile::new(fields(username, role, corredor_numero)).unwrap(),
            fecha_creacion: now,
            fecha_modificacion: now,
        }
    }
}
