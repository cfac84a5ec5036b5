//! Request metrics.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::ApiError;

/// Outcome label for a finished request.
pub fn outcome<T>(result: &Result<T, ApiError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(ApiError::Validation(_)) | Err(ApiError::PayloadTooLarge(_)) => "rejected",
        Err(err) => err.kind(),
    }
}

/// Record one request to a preview endpoint.
pub fn record_request<T>(endpoint: &'static str, result: &Result<T, ApiError>, elapsed: Duration) {
    counter!(
        "preview_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome(result)
    )
    .increment(1);
    histogram!("preview_duration_seconds", "endpoint" => endpoint).record(elapsed.as_secs_f64());
}

/// Record the size of an accepted upload.
pub fn record_upload_bytes(endpoint: &'static str, bytes: usize) {
    histogram!("preview_upload_bytes", "endpoint" => endpoint).record(bytes as f64);
}
