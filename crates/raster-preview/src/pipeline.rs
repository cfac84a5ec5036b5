//! GeoTIFF bytes → PNG data-URI and geographic bounds.

use std::time::Instant;

use geotiff_parser::RasterSource;
use preview_common::{GeoBounds, PreviewResult};
use projection::{transform_bounds, Projection, DEFAULT_DENSIFY_PTS};
use renderer::{normalize_bands, DisplayImage, PngOptions};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{PreviewConfig, MAX_DISPLAY_BANDS};

/// Result of a successful preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewOutput {
    /// `data:image/png;base64,...`
    pub image: String,
    /// Footprint in EPSG:4326.
    pub bounds: GeoBounds,
    pub width: usize,
    pub height: usize,
}

/// Stateless preview pipeline. Safe to share between threads.
#[derive(Debug, Clone)]
pub struct RasterPreviewPipeline {
    config: PreviewConfig,
    png_options: PngOptions,
}

impl RasterPreviewPipeline {
    pub fn new(config: PreviewConfig) -> Self {
        let png_options = if config.optimize_encoding {
            PngOptions::optimized()
        } else {
            PngOptions::fast()
        };
        Self { config, png_options }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Render a preview with the configured downsample factor.
    pub fn preview(&self, bytes: &[u8]) -> PreviewResult<PreviewOutput> {
        self.preview_with_factor(bytes, self.config.downsample_factor)
    }

    /// Render a preview decimated by `factor` (treated as at least 1).
    #[instrument(level = "debug", skip(self, bytes), fields(size = bytes.len()))]
    pub fn preview_with_factor(&self, bytes: &[u8], factor: usize) -> PreviewResult<PreviewOutput> {
        let start = Instant::now();

        let mut source = self.open(bytes)?;
        let bounds = geographic_bounds(&source)?;
        let open_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut block = source.read_decimated(factor)?;
        drop(source);
        let read_ms = start.elapsed().as_secs_f64() * 1000.0 - open_ms;

        let replaced = block.replace_non_finite();
        block.truncate_bands(self.config.max_bands.min(MAX_DISPLAY_BANDS));

        let bands: Vec<&[f64]> = (0..block.bands()).map(|b| block.band(b)).collect();
        let channels = normalize_bands(&bands, self.config.normalization)?;
        let image = DisplayImage::from_channels(
            &channels,
            block.cols(),
            block.rows(),
            self.config.black_threshold,
        )?;
        let data_uri = image.to_data_uri(&self.png_options)?;
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;

        debug!(
            width = image.width(),
            height = image.height(),
            bands = block.bands(),
            sample_type = %block.sample_type(),
            non_finite = replaced,
            transparent = image.transparent_pixels(),
            uri_len = data_uri.len(),
            open_ms = format!("{:.2}", open_ms),
            read_ms = format!("{:.2}", read_ms),
            total_ms = format!("{:.2}", total_ms),
            "Rendered preview"
        );

        Ok(PreviewOutput {
            image: data_uri,
            bounds,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Footprint in EPSG:4326 without decoding pixel data.
    pub fn bounds(&self, bytes: &[u8]) -> PreviewResult<GeoBounds> {
        let source = self.open(bytes)?;
        geographic_bounds(&source)
    }

    fn open<'a>(&self, bytes: &'a [u8]) -> PreviewResult<RasterSource<'a>> {
        RasterSource::open_with_memory_limit(bytes, self.config.max_decoded_bytes())
    }
}

impl Default for RasterPreviewPipeline {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

/// Native bounds, reprojected unless the source is unreferenced or already
/// in EPSG:4326.
fn geographic_bounds(source: &RasterSource<'_>) -> PreviewResult<GeoBounds> {
    let native = source.bounds();
    let crs = match source.crs() {
        Some(crs) if !crs.is_reference() => crs,
        _ => return Ok(native.into()),
    };

    let projection = Projection::from_crs(crs)?;
    let bounds = transform_bounds(&projection, &native, DEFAULT_DENSIFY_PTS)?;
    debug!(%crs, ?native, ?bounds, "Reprojected bounds to EPSG:4326");
    Ok(bounds.into())
}
