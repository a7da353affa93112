use chrono::{DateTime, Utc};
use kernel::id::MonedaId;

use crate::domain::value_object::CodigoMoneda;
use crate::error::{CatalogError, CatalogResult};

const NOMBRE_MAX_LENGTH: usize = 100;
const SIMBOLO_MAX_LENGTH: usize = 5;

/// Everything about a moneda except identity and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct MonedaFields {
    pub codigo: CodigoMoneda,
    pub nombre: String,
    pub simbolo: String,
    pub esta_activo: bool,
}

impl MonedaFields {
    pub fn new(codigo: CodigoMoneda, nombre: String, simbolo: String) -> CatalogResult<Self> {
        let fields = Self {
            codigo,
            nombre: nombre.trim().to_string(),
            simbolo: simbolo.trim().to_string(),
            esta_activo: true,
        };
        fields.validate()?;
        Ok(fields)
    }

    /// Re-check after a partial update.
    pub fn validate(&self) -> CatalogResult<()> {
        let nombre_len = self.nombre.chars().count();
        if nombre_len == 0 || nombre_len > NOMBRE_MAX_LENGTH {
            return Err(CatalogError::invalid(
                "nombre",
                format!("Name must be 1 to {NOMBRE_MAX_LENGTH} characters"),
            ));
        }

        let simbolo_len = self.simbolo.chars().count();
        if simbolo_len == 0 || simbolo_len > SIMBOLO_MAX_LENGTH {
            return Err(CatalogError::invalid(
                "simbolo",
                format!("Symbol must be 1 to {SIMBOLO_MAX_LENGTH} characters"),
            ));
        }

        if let Some(required) = self.codigo.required_simbolo() {
            if self.simbolo != required {
                return Err(CatalogError::invalid(
                    "simbolo",
                    format!("The symbol for {} must be {required}", self.codigo),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Moneda {
    pub id: MonedaId,
    pub fields: MonedaFields,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_modificacion: DateTime<Utc>,
}

impl Moneda {
    /// `"USD ($)"`
    pub fn display_code(&self) -> String {
        format!("{} ({})", self.fields.codigo, self.fields.simbolo)
    }
}
