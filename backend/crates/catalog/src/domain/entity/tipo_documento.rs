use chrono::{DateTime, Utc};
use kernel::id::TipoDocumentoId;

use crate::domain::value_object::CodigoDocumento;
use crate::error::{CatalogError, CatalogResult};

const NOMBRE_MAX_LENGTH: usize = 50;
const DESCRIPCION_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct TipoDocumentoFields {
    pub codigo: CodigoDocumento,
    pub nombre: String,
    pub descripcion: Option<String>,
    /// At most one tipo de documento carries this flag; storage enforces it.
    pub es_default: bool,
    pub esta_activo: bool,
}

impl TipoDocumentoFields {
    pub fn new(
        codigo: CodigoDocumento,
        nombre: String,
        descripcion: Option<String>,
        es_default: bool,
    ) -> CatalogResult<Self> {
        let fields = Self {
            codigo,
            nombre: nombre.trim().to_string(),
            descripcion: descripcion
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            es_default,
            esta_activo: true,
        };
        fields.validate()?;
        Ok(fields)
    }

    pub fn validate(&self) -> CatalogResult<()> {
        let nombre_len = self.nombre.chars().count();
        if nombre_len == 0 || nombre_len > NOMBRE_MAX_LENGTH {
            return Err(CatalogError::invalid(
                "nombre",
                format!("Name must be 1 to {NOMBRE_MAX_LENGTH} characters"),
            ));
        }
        if let Some(descripcion) = &self.descripcion {
            if descripcion.chars().count() > DESCRIPCION_MAX_LENGTH {
                return Err(CatalogError::invalid(
                    "descripcion",
                    format!("Description must be at most {DESCRIPCION_MAX_LENGTH} characters"),
                ));
            }
        }
        if self.es_default && !self.esta_activo {
            return Err(CatalogError::DefaultTipoDocumento);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TipoDocumento {
    pub id: TipoDocumentoId,
    pub fields: TipoDocumentoFields,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}
