//! Accounts error types.
//!
//! Every expected failure of the usuario slice is a variant here. The HTTP
//! layer renders them through `kernel::AppError`, so clients always get the
//! same problem-details shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::sqlx_error_kind, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use platform::token::TokenError;
use thiserror::Error;

pub type AccountsResult<T> = Result<T, AccountsError>;

#[derive(Debug, Error)]
pub enum AccountsError {
    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked. Try again in {minutes} minutes.")]
    AccountLocked { minutes: i64 },

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Usuario not found")]
    UsuarioNotFound,

    #[error("Username already registered")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    /// Field-level validation failure
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid password: {0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountsError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AccountsError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountsError::InvalidCredentials | AccountsError::NotAuthenticated => {
                ErrorKind::Unauthorized
            }
            AccountsError::AccountLocked { .. }
            | AccountsError::AccountDisabled
            | AccountsError::Forbidden => ErrorKind::Forbidden,
            AccountsError::UsuarioNotFound => ErrorKind::NotFound,
            AccountsError::UsernameTaken | AccountsError::EmailTaken => ErrorKind::Conflict,
            AccountsError::Validation { .. } | AccountsError::PasswordPolicy(_) => {
                ErrorKind::UnprocessableEntity
            }
            AccountsError::Database(e) => sqlx_error_kind(e),
            AccountsError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            // Never leak driver messages to clients.
            AccountsError::Database(_) if self.kind() == ErrorKind::ServiceUnavailable => {
                AppError::new(self.kind(), "Database temporarily unavailable")
                    .with_action("Retry the request shortly")
            }
            AccountsError::Database(_) | AccountsError::Internal(_) => AppError::internal("Internal server error"),
            AccountsError::Validation { field, message } => {
                AppError::new(self.kind(), "Validation failed")
                    .with_field_error(*field, message.clone())
            }
            AccountsError::PasswordPolicy(e) => AppError::new(self.kind(), "Validation failed")
                .with_field_error("password", e.to_string()),
            AccountsError::AccountLocked { minutes } => AppError::new(self.kind(), self.to_string())
                .with_action(format!("Wait {minutes} minutes before trying again")),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AccountsError::Database(e) => {
                tracing::error!(error = %e, "Accounts database error");
            }
            AccountsError::Internal(msg) => {
                tracing::error!(message = %msg, "Accounts internal error");
            }
            AccountsError::Forbidden => {
                tracing::warn!("Forbidden access to usuarios resource");
            }
            _ => {
                tracing::debug!(error = %self, "Accounts error");
            }
        }
    }
}

impl IntoResponse for AccountsError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        if matches!(
            self,
            AccountsError::NotAuthenticated | AccountsError::InvalidCredentials
        ) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<PasswordHashError> for AccountsError {
    fn from(err: PasswordHashError) -> Self {
        AccountsError::Internal(err.to_string())
    }
}

impl From<TokenError> for AccountsError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) | TokenError::UnsupportedAlgorithm(msg) => {
                AccountsError::Internal(msg)
            }
            _ => AccountsError::NotAuthenticated,
        }
    }
}
