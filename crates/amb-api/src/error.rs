//! # API Error Types
//!
//! [`AppError`] maps relayer and validation failures to HTTP status codes
//! and a uniform JSON body. Internal details are logged, never returned.

use amb_relayer::RelayerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code such as `NOT_FOUND`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Handler error.
#[derive(Error, Debug)]
pub enum AppError {
    /// 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// 422.
    #[error("validation error: {0}")]
    Validation(String),

    /// 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// 500. The message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// 503. A backing service is not attached to this API instance.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<amb_core::ValidationError> for AppError {
    fn from(err: amb_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RelayerError> for AppError {
    fn from(err: RelayerError) -> Self {
        match err {
            RelayerError::UnknownAsset(_) => Self::NotFound(err.to_string()),
            RelayerError::NotAllowed { .. } | RelayerError::Transition(_) => {
                Self::Conflict(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
