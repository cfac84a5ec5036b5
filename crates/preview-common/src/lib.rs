//! Common types shared across the raster preview crates and service.

pub mod bbox;
pub mod crs;
pub mod error;

pub use bbox::{BoundingBox, GeoBounds};
pub use crs::{Crs, CustomProjection, Ellipsoid, REFERENCE_EPSG};
pub use error::{DecodeError, PreviewError, PreviewResult, ProcessingError};
