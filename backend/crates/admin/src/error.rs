//! Admin Error Types
//!
//! This module provides admin-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

use crate::application::token::TokenError;

/// Admin-specific result type alias
pub type AdminResult<T> = Result<T, AdminError>;

/// Admin-specific error variants
///
/// Display strings are the messages clients see, so credential failures
/// share one message regardless of which factor was wrong.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A live OTP session already exists for this admin
    #[error("Session already exists and not expired")]
    SessionAlreadyPending,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Max attempts reached")]
    MaxAttemptsReached,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Admin not found")]
    AdminNotFound,

    /// Missing, invalid or unrefreshable credentials on a protected route
    #[error("Access denied")]
    AccessDenied,

    /// Authenticated, but the role does not allow the route
    #[error("Access denied")]
    InsufficientRole,

    /// Email or phone already registered
    #[error("Admin already exists")]
    AdminAlreadyExists,

    /// Request input rejected
    #[error("{0}")]
    Validation(String),

    /// OTP could not be handed to the mail relay
    #[error("OTP delivery failed: {0}")]
    Delivery(String),

    /// Access token could not be signed
    #[error("Token error: {0}")]
    Token(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::InvalidCredentials
            | AdminError::SessionAlreadyPending
            | AdminError::SessionExpired
            | AdminError::MaxAttemptsReached
            | AdminError::InvalidOtp
            | AdminError::AccessDenied => ErrorKind::Unauthorized,
            AdminError::InsufficientRole => ErrorKind::Forbidden,
            AdminError::SessionNotFound | AdminError::AdminNotFound => ErrorKind::NotFound,
            AdminError::AdminAlreadyExists | AdminError::Validation(_) => ErrorKind::BadRequest,
            AdminError::Delivery(_) => ErrorKind::ServiceUnavailable,
            AdminError::Database(_) | AdminError::Token(_) | AdminError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn into_app_error(self) -> AppError {
        match self {
            // kernel knows how to classify driver errors (pool exhaustion, ...)
            AdminError::Database(e) => AppError::from(e),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AdminError::Database(e) => {
                tracing::error!(error = %e, "Admin database error");
            }
            AdminError::Internal(msg) | AdminError::Token(msg) => {
                tracing::error!(message = %msg, "Admin internal error");
            }
            AdminError::Delivery(msg) => {
                tracing::error!(message = %msg, "OTP delivery failed");
            }
            AdminError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AdminError::MaxAttemptsReached => {
                tracing::warn!("OTP attempts exhausted");
            }
            AdminError::InsufficientRole => {
                tracing::warn!("Role check failed");
            }
            _ => {
                tracing::debug!(error = %self, "Admin error");
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        AdminError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AdminError {
    fn from(rejection: QueryRejection) -> Self {
        AdminError::Validation(rejection.body_text())
    }
}

impl From<PasswordPolicyError> for AdminError {
    fn from(err: PasswordPolicyError) -> Self {
        AdminError::Validation(err.to_string())
    }
}

impl From<PasswordHashError> for AdminError {
    fn from(err: PasswordHashError) -> Self {
        AdminError::Internal(err.to_string())
    }
}

impl From<TokenError> for AdminError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AdminError::AccessDenied,
            other => AdminError::Token(other.to_string()),
        }
    }
}
