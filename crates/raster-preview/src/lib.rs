//! Raster preview pipeline.
//!
//! Converts GeoTIFF bytes into a browser-ready preview: a decimated,
//! 8-bit normalized RGBA image as a `data:image/png;base64,` URI, plus the
//! raster footprint in EPSG:4326.
//!
//! ```ignore
//! use raster_preview::{PreviewConfig, RasterPreviewPipeline};
//!
//! let pipeline = RasterPreviewPipeline::new(PreviewConfig::default());
//! let output = pipeline.preview(&bytes)?;
//! println!("{} {:?}", output.width, output.bounds.to_lat_lon_pairs());
//! ```

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, PreviewConfig};
pub use pipeline::{PreviewOutput, RasterPreviewPipeline};
pub use preview_common::{GeoBounds, PreviewError, PreviewResult};
pub use renderer::NormalizationMode;
