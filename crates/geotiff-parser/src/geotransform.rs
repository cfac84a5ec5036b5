//! Pixel → model space affine transform.
//!
//! GeoTIFF stores the raster's placement either as a tiepoint plus pixel
//! scale (tags 33922 / 33550) or as a full 4×4 model transformation
//! (tag 34264). Both reduce to a 2D affine:
//!
//! ```text
//! | x |   | a b c |   | col |
//! | y | = | d e f | · | row |
//! | 1 |   | 0 0 1 |   |  1  |
//! ```

use nalgebra::{Matrix3, Vector3};
use preview_common::{BoundingBox, PreviewError, PreviewResult};

/// Raster-to-model affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    matrix: Matrix3<f64>,
}

impl GeoTransform {
    /// Build from GDAL-style coefficients
    /// `x = a*col + b*row + c`, `y = d*col + e*row + f`.
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> PreviewResult<Self> {
        let matrix = Matrix3::new(a, b, c, d, e, f, 0.0, 0.0, 1.0);

        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(PreviewError::georeference(
                "geotransform contains non-finite coefficients",
            ));
        }
        if matrix.try_inverse().is_none() {
            return Err(PreviewError::georeference(
                "geotransform is degenerate (zero pixel size)",
            ));
        }

        Ok(Self { matrix })
    }

    /// Build from ModelTiepointTag and ModelPixelScaleTag values.
    ///
    /// Only the first tiepoint is used. The pixel scale's Y component is
    /// positive for north-up rasters, so it is negated here.
    pub fn from_tiepoint(tiepoint: &[f64], pixel_scale: &[f64]) -> PreviewResult<Self> {
        if tiepoint.len() < 6 {
            return Err(PreviewError::georeference(format!(
                "ModelTiepointTag has {} values, expected at least 6",
                tiepoint.len()
            )));
        }
        if pixel_scale.len() < 2 {
            return Err(PreviewError::georeference(format!(
                "ModelPixelScaleTag has {} values, expected at least 2",
                pixel_scale.len()
            )));
        }

        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (pixel_scale[0], pixel_scale[1]);

        Self::from_coefficients(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy)
    }

    /// Build from the 16 row-major values of ModelTransformationTag.
    pub fn from_model_transformation(values: &[f64]) -> PreviewResult<Self> {
        if values.len() < 16 {
            return Err(PreviewError::georeference(format!(
                "ModelTransformationTag has {} values, expected 16",
                values.len()
            )));
        }
        Self::from_coefficients(values[0], values[1], values[3], values[4], values[5], values[7])
    }

    /// Shift by half a pixel for rasters flagged PixelIsPoint, so that
    /// coordinates refer to pixel corners like PixelIsArea rasters.
    pub fn pixel_is_point_shift(self) -> Self {
        let shift = Matrix3::new(1.0, 0.0, -0.5, 0.0, 1.0, -0.5, 0.0, 0.0, 1.0);
        Self {
            matrix: self.matrix * shift,
        }
    }

    /// Model coordinate of a (col, row) pixel-space position.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let p = self.matrix * Vector3::new(col, row, 1.0);
        (p.x, p.y)
    }

    /// Pixel size as (x, y); y is negative for north-up rasters.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.matrix[(0, 0)], self.matrix[(1, 1)])
    }

    /// Whether the transform has rotation or shear terms.
    pub fn is_rotated(&self) -> bool {
        self.matrix[(0, 1)] != 0.0 || self.matrix[(1, 0)] != 0.0
    }

    /// Envelope of the raster's four corners in model space.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ];

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}
