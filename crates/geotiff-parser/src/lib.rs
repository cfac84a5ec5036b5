//! GeoTIFF reader for raster previews.
//!
//! Opens a GeoTIFF held in memory and exposes:
//! - Raster metadata (dimensions, band count, sample type)
//! - The affine geotransform and native bounds
//! - The source CRS decoded from the GeoKey directory
//! - Pixel data as band-major [`PixelBlock`]s, optionally decimated
//!
//! # Supported layouts
//!
//! Decoding is delegated to the `tiff` crate: strip or tile organised,
//! uncompressed / LZW / Deflate / PackBits, 8-64 bit integer and 32/64 bit
//! float samples in chunky (pixel-interleaved) order.
//!
//! # Example
//!
//! ```ignore
//! use geotiff_parser::RasterSource;
//!
//! let mut source = RasterSource::open(&bytes)?;
//! println!("{} x {} ({} bands)", source.width(), source.height(), source.band_count());
//! let block = source.read_decimated(10)?;
//! ```

pub mod block;
pub mod geokeys;
pub mod geotransform;
pub mod source;

pub use block::{PixelBlock, SampleType};
pub use geokeys::GeoKeyDirectory;
pub use geotransform::GeoTransform;
pub use source::RasterSource;
