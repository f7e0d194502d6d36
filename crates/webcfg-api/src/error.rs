//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps errors from webcfg-core, webcfg-store, and webcfg-upstream to HTTP
//! status codes with a JSON body. Internal and upstream details are logged,
//! never returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use webcfg_core::{CodecError, ValidationError};
use webcfg_store::{AggregateError, StoreError};
use webcfg_upstream::TelemetryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request shape rejected before storage was touched (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// An upstream answered with an error status, or could not be reached
    /// (502). The upstream status is passed through when there is one.
    #[error("upstream error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// Storage or codec failure (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Upstream { status, .. } => (
                status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
            ),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream { .. } => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream { .. } => tracing::error!(error = %self, "upstream error"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TelemetryError> for AppError {
    fn from(err: TelemetryError) -> Self {
        match &err {
            TelemetryError::Upstream(e) => Self::Upstream {
                status: e.status(),
                message: err.to_string(),
            },
            TelemetryError::Store(_) | TelemetryError::Codec(_) | TelemetryError::Merge(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
