pub mod moneda;
pub mod tipo_documento;

pub use moneda::{Moneda, MonedaFields};
pub use tipo_documento::{TipoDocumento, TipoDocumentoFields};
