//! Error types for viewcast-dash
//!
//! Every pipeline and lookup failure is caught at the HTTP boundary and
//! rendered as `{"error": {"code", "message"}}`. Nothing here is fatal to the
//! process.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use viewcast_common::Error as PipelineError;

use crate::services::StatsError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Prediction pipeline error
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Live stats lookup error
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Request body over the configured upload limit (413)
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    /// Rejected body: size-limit hits keep their 413, everything else is a 400
    fn from_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(body_text)
        } else {
            ApiError::BadRequest(body_text)
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

impl ApiError {
    /// HTTP status and stable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "UPLOAD_TOO_LARGE"),
            ApiError::Pipeline(err) => match err {
                PipelineError::MalformedDuration(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_DURATION")
                }
                PipelineError::ModelNotFound(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "MODEL_NOT_FOUND")
                }
                PipelineError::ModelCorrupt(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "MODEL_CORRUPT")
                }
                PipelineError::Schema { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "SCHEMA_ERROR"),
                PipelineError::DataQuality { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "DATA_QUALITY_ERROR")
                }
                PipelineError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                PipelineError::MalformedIdentifier(_) => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_IDENTIFIER")
                }
                PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                PipelineError::Csv(_) => (StatusCode::BAD_REQUEST, "CSV_ERROR"),
                PipelineError::Config(_) | PipelineError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Stats(err) => match err {
                StatsError::NetworkError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNREACHABLE"),
                StatsError::AuthenticationFailed(_) => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_AUTH_FAILED")
                }
                StatsError::QuotaExceeded(_) => {
                    (StatusCode::TOO_MANY_REQUESTS, "UPSTREAM_QUOTA_EXCEEDED")
                }
                StatsError::VideoNotFound(_) => (StatusCode::NOT_FOUND, "VIDEO_NOT_FOUND"),
                StatsError::ApiError(..) | StatsError::ParseError(_) => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
                }
                StatsError::InvalidData(PipelineError::MalformedDuration(_)) => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_MALFORMED_DURATION")
                }
                StatsError::InvalidData(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            },
        }
    }

    /// Structured details for errors that carry lists
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Pipeline(PipelineError::Schema { missing }) => {
                Some(json!({ "missing_columns": missing }))
            }
            ApiError::Pipeline(PipelineError::DataQuality { issues }) => {
                Some(json!({ "issues": issues }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        } else {
            tracing::info!(code, error = %self, "Request rejected");
        }

        let mut error = json!({
            "code": code,
            "message": self.to_string(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
