//! Test data generators for synthetic rasters and GeoTIFFs.
//!
//! These generators create predictable, verifiable pixel patterns and wrap
//! them in real GeoTIFF bytes (written with the `tiff` encoder) so the whole
//! decode path can be exercised without external data files.

use std::io::{Cursor, Seek, Write};

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates an elevation-like grid in meters, rising from west to east.
///
/// Values range from 100 m to 1100 m.
pub fn create_elevation_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(100.0 + x_factor * 900.0 + y_factor * 100.0);
        }
    }
    data
}

/// Creates a grid with NaN values at specified `(col, row)` positions,
/// `fill` elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    fill: f32,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![fill; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates interleaved 8-bit samples for `bands` bands.
///
/// Band `b` of pixel `(col, row)` holds `(col + row * 3 + b * 40) % 256`, so
/// every band is distinguishable and values span a wide range.
pub fn create_interleaved_u8(width: usize, height: usize, bands: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * bands);
    for row in 0..height {
        for col in 0..width {
            for band in 0..bands {
                data.push(((col + row * 3 + band * 40) % 256) as u8);
            }
        }
    }
    data
}

/// Creates RGB pixels where the left half is black and the right half is
/// bright. Useful for checking near-black masking.
pub fn create_half_black_rgb(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for _row in 0..height {
        for col in 0..width {
            if col < width / 2 {
                data.extend_from_slice(&[0, 0, 0]);
            } else {
                data.extend_from_slice(&[250, 200, 150]);
            }
        }
    }
    data
}

/// Placement of the raster in model space.
#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Tiepoint at pixel (0, 0) plus pixel scale.
    Tiepoint {
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
    },
    /// Full 4×4 ModelTransformationTag, row-major.
    Transformation([f64; 16]),
}

/// Builder for in-memory GeoTIFF test files.
///
/// # Example
///
/// ```
/// use test_utils::GeoTiffBuilder;
///
/// let bytes = GeoTiffBuilder::new(20, 10)
///     .origin(10.0, 50.0, 0.1, 0.1)
///     .geographic(4326)
///     .gray8(&vec![7u8; 200]);
/// assert_eq!(&bytes[..2], b"II");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    placement: Option<Placement>,
    /// GeoKey entries `[key_id, location, count, value_offset]`
    geokeys: Vec<[u16; 4]>,
    geo_doubles: Vec<f64>,
}

impl GeoTiffBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            placement: None,
            geokeys: Vec::new(),
            geo_doubles: Vec::new(),
        }
    }

    /// North-up placement: upper-left corner at `(origin_x, origin_y)`.
    pub fn origin(mut self, origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        self.placement = Some(Placement::Tiepoint {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        });
        self
    }

    /// Placement via ModelTransformationTag.
    pub fn model_transformation(mut self, matrix: [f64; 16]) -> Self {
        self.placement = Some(Placement::Transformation(matrix));
        self
    }

    /// Geographic model with the given GeographicTypeGeoKey.
    pub fn geographic(self, epsg: u16) -> Self {
        self.short_key(1024, 2).short_key(2048, epsg)
    }

    /// Projected model with the given ProjectedCSTypeGeoKey.
    pub fn projected(self, epsg: u16) -> Self {
        self.short_key(1024, 1).short_key(3072, epsg)
    }

    /// User-defined Lambert Conformal Conic (2SP) on GRS80, in meters.
    pub fn lambert_conformal_2sp(
        self,
        lat_origin: f64,
        lon_origin: f64,
        standard_parallels: (f64, f64),
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        self.short_key(1024, 1)
            .short_key(2048, 4258)
            .short_key(3072, 32767)
            .short_key(3075, 8)
            .short_key(3076, 9001)
            .double_key(3078, standard_parallels.0)
            .double_key(3079, standard_parallels.1)
            .double_key(3084, lon_origin)
            .double_key(3085, lat_origin)
            .double_key(3086, false_easting)
            .double_key(3087, false_northing)
    }

    /// Mark coordinates as referring to pixel centres.
    pub fn pixel_is_point(self) -> Self {
        self.short_key(1025, 2)
    }

    /// Add an inline short GeoKey.
    pub fn short_key(mut self, key_id: u16, value: u16) -> Self {
        self.geokeys.retain(|entry| entry[0] != key_id);
        self.geokeys.push([key_id, 0, 1, value]);
        self
    }

    /// Add a GeoKey stored in GeoDoubleParamsTag.
    pub fn double_key(mut self, key_id: u16, value: f64) -> Self {
        self.geokeys.retain(|entry| entry[0] != key_id);
        let offset = self.geo_doubles.len() as u16;
        self.geo_doubles.push(value);
        self.geokeys.push([key_id, 34736, 1, offset]);
        self
    }

    pub fn gray8(&self, data: &[u8]) -> Vec<u8> {
        self.encode::<colortype::Gray8>(data)
    }

    pub fn gray16(&self, data: &[u16]) -> Vec<u8> {
        self.encode::<colortype::Gray16>(data)
    }

    pub fn gray32f(&self, data: &[f32]) -> Vec<u8> {
        self.encode::<colortype::Gray32Float>(data)
    }

    pub fn rgb8(&self, data: &[u8]) -> Vec<u8> {
        self.encode::<colortype::RGB8>(data)
    }

    /// Four 8-bit bands, pixel-interleaved.
    pub fn rgba8(&self, data: &[u8]) -> Vec<u8> {
        self.encode::<colortype::RGBA8>(data)
    }

    fn encode<C>(&self, data: &[C::Inner]) -> Vec<u8>
    where
        C: ColorType,
        [C::Inner]: TiffValue,
    {
        let mut buf = Vec::new();
        {
            let mut encoder =
                TiffEncoder::new(Cursor::new(&mut buf)).expect("failed to create TIFF encoder");
            let mut image = encoder
                .new_image::<C>(self.width, self.height)
                .expect("failed to start TIFF image");
            self.write_geo_tags(image.encoder());
            image.write_data(data).expect("failed to write TIFF data");
        }
        buf
    }

    fn write_geo_tags<W: Write + Seek, K: TiffKind>(&self, dir: &mut DirectoryEncoder<W, K>) {
        match self.placement {
            Some(Placement::Tiepoint {
                origin_x,
                origin_y,
                pixel_width,
                pixel_height,
            }) => {
                let scale = [pixel_width, pixel_height, 0.0];
                let tiepoint = [0.0, 0.0, 0.0, origin_x, origin_y, 0.0];
                dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])
                    .expect("failed to write ModelPixelScaleTag");
                dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..])
                    .expect("failed to write ModelTiepointTag");
            }
            Some(Placement::Transformation(matrix)) => {
                dir.write_tag(Tag::ModelTransformationTag, &matrix[..])
                    .expect("failed to write ModelTransformationTag");
            }
            None => {}
        }

        if !self.geokeys.is_empty() {
            let mut directory: Vec<u16> = vec![1, 1, 0, self.geokeys.len() as u16];
            let mut keys = self.geokeys.clone();
            keys.sort_by_key(|entry| entry[0]);
            for entry in keys {
                directory.extend_from_slice(&entry);
            }
            dir.write_tag(Tag::GeoKeyDirectoryTag, &directory[..])
                .expect("failed to write GeoKeyDirectoryTag");
        }

        if !self.geo_doubles.is_empty() {
            dir.write_tag(Tag::GeoDoubleParamsTag, &self.geo_doubles[..])
                .expect("failed to write GeoDoubleParamsTag");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_grid() {
        let grid = create_test_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0); // col=0, row=0
        assert_eq!(grid[1], 1000.0); // col=1, row=0
        assert_eq!(grid[10], 1.0); // col=0, row=1
        assert_eq!(grid[11], 1001.0); // col=1, row=1
    }

    #[test]
    fn test_create_elevation_grid() {
        let grid = create_elevation_grid(100, 100);
        assert_eq!(grid.len(), 10000);
        let min = grid.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = grid.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(min >= 100.0);
        assert!(max <= 1100.0);
    }

    #[test]
    fn test_create_grid_with_nans() {
        let grid = create_grid_with_nans(10, 10, 1.0, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan()); // (0, 0)
        assert!(grid[55].is_nan()); // row 5 * 10 + col 5
        assert_eq!(grid[1], 1.0);
    }

    #[test]
    fn test_create_interleaved_u8() {
        let data = create_interleaved_u8(4, 2, 3);
        assert_eq!(data.len(), 24);
        assert_eq!(&data[..3], &[0, 40, 80]);
        // pixel (col 1, row 1)
        assert_eq!(&data[15..18], &[4, 44, 84]);
    }

    #[test]
    fn test_builder_writes_little_endian_tiff() {
        let bytes = GeoTiffBuilder::new(4, 4)
            .origin(0.0, 4.0, 1.0, 1.0)
            .projected(32633)
            .gray8(&[1u8; 16]);
        assert_eq!(&bytes[..4], &[0x49, 0x49, 42, 0]);
    }

    #[test]
    fn test_builder_replaces_duplicate_keys() {
        let builder = GeoTiffBuilder::new(1, 1).geographic(4326).geographic(4269);
        assert_eq!(builder.geokeys.len(), 2);
        assert!(builder.geokeys.contains(&[2048, 0, 1, 4269]));
    }
}
