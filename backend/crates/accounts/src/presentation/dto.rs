//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::UsuarioId;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::entity::Usuario;
use crate::domain::value_object::Role;

// ============================================================================
// Login
// ============================================================================

/// Form body of `POST /login` (OAuth2 password-grant field names)
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub usuario: UsuarioResponse,
}

// ============================================================================
// Usuario
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UsuarioResponse {
    pub id: UsuarioId,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub role: Role,
    pub corredor_numero: Option<i64>,
    pub comision_porcentaje: f64,
    pub telefono: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl From<&Usuario> for UsuarioResponse {
    fn from(usuario: &Usuario) -> Self {
        let profile = &usuario.profile;
        Self {
            id: usuario.id,
            nombre: profile.nombre.clone(),
            apellido: profile.apellido.clone(),
            email: profile.email.to_string(),
            username: profile.username.to_string(),
            is_active: profile.is_enabled,
            is_superuser: profile.is_superuser,
            role: profile.role(),
            corredor_numero: profile.corredor_numero(),
            comision_porcentaje: profile.comision_porcentaje(),
            telefono: profile.telefono.clone(),
            fecha_creacion: usuario.fecha_creacion,
            fecha_modificacion: usuario.fecha_modificacion,
        }
    }
}

impl From<Usuario> for UsuarioResponse {
    fn from(usuario: Usuario) -> Self {
        Self::from(&usuario)
    }
}

fn default_true() -> bool {
    true
}

fn default_role() -> Role {
    Role::Corredor
}

#[derive(Deserialize)]
pub struct RegisterUsuarioRequest {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_role")]
    pub role: Role,
    pub corredor_numero: Option<i64>,
    #[serde(default)]
    pub comision_porcentaje: Option<f64>,
    pub telefono: Option<String>,
}

/// Absent fields are left unchanged; `null` clears nullable ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUsuarioRequest {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "present")]
    pub corredor_numero: Option<Option<i64>>,
    pub comision_porcentaje: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub telefono: Option<Option<String>>,
}

/// Distinguish an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub usuario_id: UsuarioId,
    #[serde(default)]
    pub contrasena_actual: Option<String>,
    pub nueva_contrasena: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    crate::application::query_usuarios::DEFAULT_PAGE_SIZE
}
