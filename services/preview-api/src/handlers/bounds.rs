//! POST /get-bounds - EPSG:4326 bounds only, lon-first.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::Extension;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use super::upload::read_file_field;
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

const ENDPOINT: &str = "get-bounds";

#[derive(Debug, Serialize)]
pub struct BoundsResponse {
    /// `[[west, south], [east, north]]`
    pub bounds: [[f64; 2]; 2],
}

pub async fn get_bounds_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BoundsResponse>, ApiError> {
    let start = Instant::now();
    let result = bounds(state, multipart).await;
    metrics::record_request(ENDPOINT, &result, start.elapsed());

    if let Err(err) = &result {
        warn!(endpoint = ENDPOINT, kind = err.kind(), error = %err, "Request failed");
    }
    result.map(Json)
}

async fn bounds(
    state: Arc<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<BoundsResponse, ApiError> {
    let bytes = read_file_field(multipart).await?;
    metrics::record_upload_bytes(ENDPOINT, bytes.len());

    let bounds = tokio::task::spawn_blocking(move || state.pipeline.bounds(&bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(BoundsResponse {
        bounds: bounds.to_lon_lat_pairs(),
    })
}
