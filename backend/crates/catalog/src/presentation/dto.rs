//! Data Transfer Objects

use chrono::{DateTime, Utc};
use kernel::id::{MonedaId, TipoDocumentoId};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::entity::{Moneda, TipoDocumento};

// ============================================================================
// Monedas
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MonedaResponse {
    pub id: MonedaId,
    pub codigo: String,
    pub nombre: String,
    pub simbolo: String,
    pub esta_activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl From<&Moneda> for MonedaResponse {
    fn from(m: &Moneda) -> Self {
        Self {
            id: m.id,
            codigo: m.fields.codigo.to_string(),
            nombre: m.fields.nombre.clone(),
            simbolo: m.fields.simbolo.clone(),
            esta_activo: m.fields.esta_activo,
            fecha_creacion: m.fecha_creacion,
            fecha_modificacion: m.fecha_modificacion,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMonedaRequest {
    pub codigo: String,
    pub nombre: String,
    pub simbolo: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMonedaRequest {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub simbolo: Option<String>,
    pub esta_activo: Option<bool>,
}

// ============================================================================
// Tipos de documento
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TipoDocumentoResponse {
    pub id: TipoDocumentoId,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub es_default: bool,
    pub esta_activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl From<&TipoDocumento> for TipoDocumentoResponse {
    fn from(t: &TipoDocumento) -> Self {
        Self {
            id: t.id,
            codigo: t.fields.codigo.to_string(),
            nombre: t.fields.nombre.clone(),
            descripcion: t.fields.descripcion.clone(),
            es_default: t.fields.es_default,
            esta_activo: t.fields.esta_activo,
            fecha_creacion: t.fecha_creacion,
            fecha_modificacion: t.fecha_modificacion,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTipoDocumentoRequest {
    pub codigo: String,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub es_default: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTipoDocumentoRequest {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub descripcion: Option<Option<String>>,
    pub es_default: Option<bool>,
    pub esta_activo: Option<bool>,
}

/// `null` clears, absent leaves unchanged.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
