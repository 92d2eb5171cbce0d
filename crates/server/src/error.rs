//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! the response body is always JSON of the form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use charkha_core::IdParseError;

use crate::db::RepositoryError;
use crate::services::mailer::MailerError;
use crate::services::otp::OtpError;
use crate::services::payment::PaymentError;
use crate::services::shipping::ShippingError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Shipping provider operation failed.
    #[error("Shipping error: {0}")]
    Shipping(#[from] ShippingError),

    /// OTP issuance or verification failed.
    #[error("OTP error: {0}")]
    Otp(#[from] OtpError),

    /// Outbound mail failed.
    #[error("Mail error: {0}")]
    Mail(#[from] MailerError),

    /// Request payload failed schema validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced identifier is malformed. Rejected before any query runs.
    #[error("Invalid reference: {0}")]
    InvalidReference(#[from] IdParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role does not permit this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl AppError {
    /// Whether this error is a server-side fault worth capturing.
    fn is_server_fault(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Otp(err) => matches!(err, OtpError::Dispatch(_)),
            Self::Payment(_) | Self::Shipping(_) | Self::Mail(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_)
                | RepositoryError::InsufficientStock(_)
                | RepositoryError::InvalidTransition { .. } => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Payment(_) | Self::Shipping(_) | Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Otp(err) => match err {
                OtpError::Dispatch(_) => StatusCode::BAD_GATEWAY,
                OtpError::NotFound | OtpError::Expired | OtpError::Mismatch => {
                    StatusCode::BAD_REQUEST
                }
            },
            Self::Validation(_) | Self::InvalidReference(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal detail is never exposed for
    /// server-side faults.
    fn client_message(&self) -> String {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                RepositoryError::InsufficientStock(id) => {
                    format!("insufficient stock for product {id}")
                }
                RepositoryError::InvalidTransition { from, to } => {
                    format!("order cannot move from {from} to {to}")
                }
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "internal server error".to_string()
                }
            },
            Self::Payment(_) => "payment gateway error".to_string(),
            Self::Shipping(_) => "shipping provider error".to_string(),
            Self::Mail(_) => "mail delivery error".to_string(),
            Self::Otp(err) => err.to_string(),
            Self::Internal(_) => "internal server error".to_string(),
            Self::Validation(msg) | Self::NotFound(msg) | Self::Unauthorized(msg)
            | Self::Forbidden(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::InvalidReference(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side faults to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(serde_json::json!({ "error": self.client_message() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use charkha_core::{OrderStatus, ProductId};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InvalidReference(IdParseError::new("zzz"))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::InsufficientStock(
                ProductId::generate()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_otp_error_mapping() {
        assert_eq!(
            get_status(AppError::Otp(OtpError::Expired)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Otp(OtpError::Dispatch("down".to_string()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.client_message(), "internal server error");
    }
}
