use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::clients::event_directory::DirectoryError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Payment error: {0}")]
    PaymentError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::DomainError(_)
            | AppError::PaymentError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::UpstreamError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DomainError(_) => "DOMAIN_ERROR",
            AppError::PaymentError(_) => "PAYMENT_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::AccessDenied(_) => "ACCESS_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::UpstreamError(_) => "UPSTREAM_ERROR",
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::DomainError(msg)
            | AppError::PaymentError(msg)
            | AppError::AuthError(msg)
            | AppError::AccessDenied(msg)
            | AppError::NotFound(msg)
            | AppError::UpstreamError(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::UpstreamError(msg) => {
                error!(code = self.code(), message = %msg, "Upstream failure");
            }
            _ => {
                warn!(code = self.code(), message = %self.public_message(), "Request rejected");
            }
        }
    }

    /// Read-path mapping: a missing event is a 404, anything else fails closed.
    pub fn from_event_lookup(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => AppError::NotFound("Event not found".to_string()),
            other => {
                error!(error = %other, "Event directory lookup failed");
                AppError::UpstreamError("Failed to fetch event".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        error_response(code, self.public_message(), status)
    }
}
