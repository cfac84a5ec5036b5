//! Integration tests for RasterSource over synthetic GeoTIFFs.

use geotiff_parser::{RasterSource, SampleType};
use preview_common::{BoundingBox, Crs, CustomProjection};
use test_utils::fixtures::{bbox, malformed};
use test_utils::{
    assert_approx_eq, create_grid_with_nans, create_interleaved_u8, create_test_grid,
    GeoTiffBuilder,
};

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_geographic_gray8_metadata() {
    let (min_x, min_y, max_x, max_y) = bbox::BAVARIA_DEGREES;
    let bytes = GeoTiffBuilder::new(100, 50)
        .origin(min_x, max_y, 0.01, 0.02)
        .geographic(4326)
        .gray8(&vec![42u8; 100 * 50]);

    let source = RasterSource::open(&bytes).unwrap();
    assert_eq!(source.width(), 100);
    assert_eq!(source.height(), 50);
    assert_eq!(source.band_count(), 1);
    assert_eq!(source.sample_type(), SampleType::U8);
    assert_eq!(source.crs(), Some(&Crs::Epsg(4326)));

    let bounds = source.bounds();
    assert_approx_eq!(bounds.min_x, min_x, 1e-9);
    assert_approx_eq!(bounds.min_y, min_y, 1e-9);
    assert_approx_eq!(bounds.max_x, max_x, 1e-9);
    assert_approx_eq!(bounds.max_y, max_y, 1e-9);
}

#[test]
fn test_projected_rgb_metadata() {
    let (min_x, _, _, max_y) = bbox::UTM33N_10KM;
    let bytes = GeoTiffBuilder::new(100, 100)
        .origin(min_x, max_y, 100.0, 100.0)
        .projected(32633)
        .rgb8(&create_interleaved_u8(100, 100, 3));

    let source = RasterSource::open(&bytes).unwrap();
    assert_eq!(source.band_count(), 3);
    assert_eq!(source.crs(), Some(&Crs::Epsg(32633)));

    let (a, b, c, d) = bbox::UTM33N_10KM;
    assert_eq!(source.bounds(), BoundingBox::new(a, b, c, d));
}

#[test]
fn test_float_sample_type() {
    let bytes = GeoTiffBuilder::new(10, 5)
        .origin(0.0, 5.0, 1.0, 1.0)
        .gray32f(&create_test_grid(10, 5));

    let source = RasterSource::open(&bytes).unwrap();
    assert_eq!(source.sample_type(), SampleType::F32);
    assert!(source.sample_type().is_float());
}

#[test]
fn test_no_georeferencing_uses_pixel_grid() {
    let bytes = GeoTiffBuilder::new(30, 20).gray8(&vec![0u8; 600]);

    let source = RasterSource::open(&bytes).unwrap();
    assert!(source.crs().is_none());
    assert!(source.geotransform().is_none());
    assert_eq!(source.bounds(), BoundingBox::new(0.0, 0.0, 30.0, 20.0));
}

#[test]
fn test_model_transformation_bounds() {
    #[rustfmt::skip]
    let matrix = [
        10.0, 0.0, 0.0, 300_000.0,
        0.0, -10.0, 0.0, 5_000_000.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let bytes = GeoTiffBuilder::new(50, 40)
        .model_transformation(matrix)
        .projected(32632)
        .gray16(&vec![1000u16; 50 * 40]);

    let source = RasterSource::open(&bytes).unwrap();
    assert_eq!(source.sample_type(), SampleType::U16);
    assert_eq!(
        source.bounds(),
        BoundingBox::new(300_000.0, 4_999_600.0, 300_500.0, 5_000_000.0)
    );
}

#[test]
fn test_pixel_is_point_shifts_bounds() {
    let bytes = GeoTiffBuilder::new(10, 10)
        .origin(0.0, 10.0, 1.0, 1.0)
        .geographic(4326)
        .pixel_is_point()
        .gray8(&[0u8; 100]);

    let bounds = RasterSource::open(&bytes).unwrap().bounds();
    assert_eq!(bounds, BoundingBox::new(-0.5, 0.5, 9.5, 10.5));
}

#[test]
fn test_user_defined_lambert() {
    let (min_x, _, _, max_y) = bbox::LAMBERT93_PARIS;
    let bytes = GeoTiffBuilder::new(20, 20)
        .origin(min_x, max_y, 1000.0, 1000.0)
        .lambert_conformal_2sp(46.5, 3.0, (49.0, 44.0), 700_000.0, 6_600_000.0)
        .gray8(&[9u8; 400]);

    let source = RasterSource::open(&bytes).unwrap();
    match source.crs() {
        Some(Crs::Custom(CustomProjection::LambertConformal {
            standard_parallel_1,
            standard_parallel_2,
            false_northing,
            ..
        })) => {
            assert_eq!(*standard_parallel_1, 49.0);
            assert_eq!(*standard_parallel_2, 44.0);
            assert_eq!(*false_northing, 6_600_000.0);
        }
        other => panic!("expected user-defined Lambert, got {:?}", other),
    }
}

// ============================================================================
// Pixel reads
// ============================================================================

#[test]
fn test_full_resolution_read_is_band_major() {
    let data = create_interleaved_u8(4, 3, 3);
    let bytes = GeoTiffBuilder::new(4, 3).rgb8(&data);

    let mut source = RasterSource::open(&bytes).unwrap();
    let block = source.read(3, 4).unwrap();

    assert_eq!(block.bands(), 3);
    assert_eq!((block.rows(), block.cols()), (3, 4));
    for row in 0..3 {
        for col in 0..4 {
            for band in 0..3 {
                let interleaved = data[(row * 4 + col) * 3 + band] as f64;
                assert_eq!(block.get(band, row, col), interleaved);
            }
        }
    }
}

#[test]
fn test_decimated_read_shape() {
    let bytes = GeoTiffBuilder::new(105, 48).gray32f(&create_test_grid(105, 48));

    let mut source = RasterSource::open(&bytes).unwrap();
    let block = source.read_decimated(10).unwrap();
    assert_eq!((block.rows(), block.cols()), (4, 10));

    // Output pixel (0, 0) samples source (col 5, row 6): 5 * 1000 + 6
    assert_eq!(block.get(0, 0, 0), 5006.0);
}

#[test]
fn test_decimation_clamps_to_one_pixel() {
    let bytes = GeoTiffBuilder::new(5, 3).gray8(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);

    let mut source = RasterSource::open(&bytes).unwrap();
    let block = source.read_decimated(10).unwrap();
    assert_eq!((block.rows(), block.cols()), (1, 1));
    // Centre pixel (col 2, row 1)
    assert_eq!(block.get(0, 0, 0), 8.0);
}

#[test]
fn test_nan_samples_survive_read() {
    let grid = create_grid_with_nans(4, 4, 2.5, &[(1, 1)]);
    let bytes = GeoTiffBuilder::new(4, 4).gray32f(&grid);

    let mut block = RasterSource::open(&bytes).unwrap().read(4, 4).unwrap();
    assert!(block.get(0, 1, 1).is_nan());
    assert_eq!(block.replace_non_finite(), 1);
    assert_eq!(block.get(0, 1, 1), 0.0);
}

#[test]
fn test_four_band_read() {
    let bytes = GeoTiffBuilder::new(8, 8).rgba8(&create_interleaved_u8(8, 8, 4));

    let mut source = RasterSource::open(&bytes).unwrap();
    assert_eq!(source.band_count(), 4);
    let block = source.read(8, 8).unwrap();
    assert_eq!(block.bands(), 4);
    assert_eq!(block.get(3, 0, 0), 120.0);
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_malformed_inputs_are_decode_errors() {
    for (label, bytes) in malformed::all() {
        let err = RasterSource::open(bytes).expect_err(label);
        assert_eq!(err.kind(), "decode", "{}: {}", label, err);
    }
}

#[test]
fn test_truncated_tiff_fails_without_panic() {
    let valid = GeoTiffBuilder::new(64, 64)
        .origin(0.0, 64.0, 1.0, 1.0)
        .geographic(4326)
        .gray8(&vec![200u8; 64 * 64]);
    let truncated = malformed::truncated(&valid);

    let result = RasterSource::open(&truncated).and_then(|mut s| s.read_decimated(10));
    assert!(result.is_err());
}

#[test]
fn test_memory_limit_rejects_large_decode() {
    let bytes = GeoTiffBuilder::new(64, 64).gray8(&vec![1u8; 64 * 64]);

    let result = RasterSource::open_with_memory_limit(&bytes, 1024).and_then(|mut s| s.read(64, 64));
    let err = result.unwrap_err();
    assert_eq!(err.kind(), "decode");
}
