//! HTTP error responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use preview_common::PreviewError;
use thiserror::Error;

/// Errors returned by the preview endpoints.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The pipeline rejected the raster. Always 500.
    #[error(transparent)]
    Preview(#[from] PreviewError),

    /// The request itself is unusable (no `file` field, bad query).
    #[error("{0}")]
    Validation(String),

    /// The upload exceeded the body limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The blocking task running the pipeline did not complete.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Preview(err) => StatusCode::from_u16(err.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Preview(err) => err.kind(),
            ApiError::Validation(_) => "validation",
            ApiError::PayloadTooLarge(_) => "too_large",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
