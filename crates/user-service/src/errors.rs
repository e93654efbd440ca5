//! User Service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Messages returned to clients for 5xx outcomes are generic; the actual
//! cause is logged server-side together with the failing operation.
//! 4xx outcomes are expected client-input issues and are not logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// User Service error type.
///
/// Maps to HTTP status codes:
/// - Validation: 400 Bad Request
/// - NotFound: 404 Not Found
/// - StoreUnavailable, StoreTimeout, Internal: 500 Internal Server Error
///
/// The health endpoint reports 503 through its own body and never goes
/// through this type.
#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable during {operation}: {cause}")]
    StoreUnavailable {
        operation: &'static str,
        cause: String,
    },

    #[error("Store call {operation} exceeded deadline of {deadline:?}")]
    StoreTimeout {
        operation: &'static str,
        deadline: Duration,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl UserServiceError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            UserServiceError::Validation(_) => 400,
            UserServiceError::NotFound(_) => 404,
            UserServiceError::StoreUnavailable { .. }
            | UserServiceError::StoreTimeout { .. }
            | UserServiceError::Internal(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for UserServiceError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            UserServiceError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            UserServiceError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            UserServiceError::StoreUnavailable { operation, cause } => {
                tracing::error!(target: "us.store", operation, error = %cause, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            UserServiceError::StoreTimeout { operation, deadline } => {
                tracing::error!(
                    target: "us.store",
                    operation,
                    deadline_ms = deadline.as_millis() as u64,
                    "Store operation timed out"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            UserServiceError::Internal(reason) => {
                tracing::error!(target: "us.internal", reason = %reason, "Unhandled failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Response for a request whose handler panicked.
///
/// Used by the router's `CatchPanicLayer` so panics get the same error body
/// and `us.internal` log as every other 5xx.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    UserServiceError::Internal("handler panicked".to_string()).into_response()
}
