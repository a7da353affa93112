//! Catalog error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Moneda not found")]
    MonedaNotFound,

    #[error("A moneda with codigo {0} already exists")]
    MonedaCodigoTaken(String),

    #[error("Tipo de documento not found")]
    TipoDocumentoNotFound,

    #[error("A tipo de documento with codigo {0} already exists")]
    TipoDocumentoCodigoTaken(String),

    /// The default tipo de documento cannot be deleted or deactivated
    #[error("Operation not allowed on the default tipo de documento")]
    DefaultTipoDocumento,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        CatalogError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::MonedaNotFound | CatalogError::TipoDocumentoNotFound => {
                ErrorKind::NotFound
            }
            CatalogError::MonedaCodigoTaken(_)
            | CatalogError::TipoDocumentoCodigoTaken(_)
            | CatalogError::DefaultTipoDocumento => ErrorKind::Conflict,
            CatalogError::Forbidden => ErrorKind::Forbidden,
            CatalogError::Validation { .. } => ErrorKind::UnprocessableEntity,
            CatalogError::Database(e) => sqlx_error_kind(e),
            CatalogError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            CatalogError::Database(_) if self.kind() == ErrorKind::ServiceUnavailable => {
                AppError::new(self.kind(), "Database temporarily unavailable")
                    .with_action("Retry the request shortly")
            }
            CatalogError::Database(_) | CatalogError::Internal(_) => AppError::internal("Internal server error"),
            CatalogError::Validation { field, message } => {
                AppError::new(self.kind(), "Validation failed")
                    .with_field_error(*field, message.clone())
            }
            CatalogError::MonedaCodigoTaken(_) | CatalogError::TipoDocumentoCodigoTaken(_) => {
                AppError::new(self.kind(), self.to_string())
                    .with_field_error("codigo", self.to_string())
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            CatalogError::Database(e) => {
                tracing::error!(error = %e, "Catalog database error");
            }
            CatalogError::Internal(msg) => {
                tracing::error!(message = %msg, "Catalog internal error");
            }
            CatalogError::Forbidden => {
                tracing::warn!("Forbidden write on reference data");
            }
            _ => {
                tracing::debug!(error = %self, "Catalog error");
            }
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CatalogError::MonedaNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CatalogError::MonedaCodigoTaken("USD".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(CatalogError::DefaultTipoDocumento.status_code(), StatusCode::CONFLICT);
        assert_eq!(CatalogError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            CatalogError::invalid("codigo", "bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_duplicate_codigo_points_at_field() {
        let app = CatalogError::TipoDocumentoCodigoTaken("RUT".into()).to_app_error();
        assert_eq!(app.field_errors()[0].field, "codigo");
    }

    #[test]
    fn test_database_details_are_hidden() {
        let err = CatalogError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_app_error().message(), "Internal server error");
    }

    #[test]
    fn test_exhausted_pool_is_service_unavailable() {
        let err = CatalogError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_app_error().action().is_some());
    }
}
