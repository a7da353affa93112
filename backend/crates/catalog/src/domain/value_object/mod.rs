pub mod codigo;

pub use codigo::{CodigoDocumento, CodigoMoneda};
