//! Coordinate reference system transformations.
//!
//! Implements the map projections needed to bring raster bounds into
//! geographic coordinates, from scratch without external dependencies.

pub mod error;
pub mod lambert;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use error::{ProjectionError, ProjectionResult};
pub use lambert::LambertConformal;
pub use mercator::{Mercator, WebMercator};
pub use transform::{transform_bounds, Projection, DEFAULT_DENSIFY_PTS};
pub use transverse_mercator::TransverseMercator;
