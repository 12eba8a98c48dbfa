//! API error types and response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error type with HTTP status code mapping.
///
/// Every failure is reported as 500, matching what existing callers expect.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body could not be read or decompressed
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// Body is not a JSON playbook configuration
    #[error("Body parse error: {0}")]
    BodyParse(String),

    /// All queue slots are taken
    #[error("work queue full")]
    QueueFull,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Get the error code for machine parsing.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BodyRead(_) => "BODY_READ_ERROR",
            ApiError::BodyParse(_) => "BODY_PARSE_ERROR",
            ApiError::QueueFull => "QUEUE_FULL",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for machine parsing
    pub error: String,
    /// Human-readable error message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<crate::error::Error> for ApiError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::QueueFull => ApiError::QueueFull,
            crate::error::Error::Json(e) => ApiError::BodyParse(e.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
