//! Application state for the preview API.

use metrics_exporter_prometheus::PrometheusHandle;
use raster_preview::{PreviewConfig, RasterPreviewPipeline};

/// Default cap on request bodies.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 512;

/// Shared, immutable application state.
pub struct AppState {
    pub pipeline: RasterPreviewPipeline,

    /// Largest accepted request body in bytes.
    pub max_upload_bytes: usize,

    /// Renders `/metrics`. `None` when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            pipeline: RasterPreviewPipeline::new(config),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            prometheus: None,
        }
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
