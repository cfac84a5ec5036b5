//! Preview API Service Library
//!
//! HTTP boundary for the raster preview pipeline: multipart GeoTIFF uploads
//! in, PNG data-URIs and EPSG:4326 bounds out.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the router with all routes and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // Raster preview
        .route("/convert-tiff", post(handlers::convert::convert_tiff_handler))
        .route("/convert-tiff/", post(handlers::convert::convert_tiff_handler))
        // Bounds only
        .route("/get-bounds", post(handlers::bounds::get_bounds_handler))
        .route("/get-bounds/", post(handlers::bounds::get_bounds_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
