//! POST /convert-tiff - PNG data-URI preview plus lat-first bounds.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query};
use axum::Json;
use raster_preview::config::MAX_DOWNSAMPLE_FACTOR;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::upload::read_file_field;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "convert-tiff";

#[derive(Debug, Default, Deserialize)]
pub struct ConvertParams {
    /// Downsample factor override, 1-100.
    pub factor: Option<String>,
}

impl ConvertParams {
    fn factor(&self) -> Result<Option<usize>, ApiError> {
        let Some(raw) = self.factor.as_deref() else {
            return Ok(None);
        };
        match raw.trim().parse::<usize>() {
            Ok(f) if (1..=MAX_DOWNSAMPLE_FACTOR).contains(&f) => Ok(Some(f)),
            _ => Err(ApiError::validation(format!(
                "factor must be an integer between 1 and {}, got '{}'",
                MAX_DOWNSAMPLE_FACTOR, raw
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub base64_image: String,
    /// `[[south, west], [north, east]]`
    pub bounds: [[f64; 2]; 2],
}

pub async fn convert_tiff_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<ConvertParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let start = Instant::now();
    let result = convert(state, params, multipart).await;
    metrics::record_request(ENDPOINT, &result, start.elapsed());

    if let Err(err) = &result {
        warn!(endpoint = ENDPOINT, kind = err.kind(), error = %err, "Request failed");
    }
    result.map(Json)
}

async fn convert(
    state: Arc<AppState>,
    params: Result<Query<ConvertParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ConvertResponse, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let factor = params.factor()?;
    let bytes = read_file_field(multipart).await?;
    metrics::record_upload_bytes(ENDPOINT, bytes.len());

    let size = bytes.len();
    let output = tokio::task::spawn_blocking(move || {
        let factor = factor.unwrap_or(state.pipeline.config().downsample_factor);
        state.pipeline.preview_with_factor(&bytes, factor)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    info!(
        size,
        width = output.width,
        height = output.height,
        "Converted raster preview"
    );

    Ok(ConvertResponse {
        base64_image: output.image,
        bounds: output.bounds.to_lat_lon_pairs(),
    })
}
