//! Tests for PNG encoding and display image assembly.
//!
//! Every encoded PNG is decoded back with the `image` crate, so these check
//! that the hand-written encoder produces files a standard decoder accepts:
//! - RGBA and indexed output
//! - Adaptive filtering on gradients and noise
//! - Transparency of masked pixels
//! - Data-URI payloads

use image::ImageFormat;
use renderer::png::{create_png, create_png_indexed, encode_rgba};
use renderer::{decode_png_data_uri, normalize_bands, DisplayImage, NormalizationMode, PngOptions};
use std::collections::HashSet;

// ============================================================================
// Helper functions
// ============================================================================

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, ImageFormat::Png)
        .expect("standard decoder rejected our PNG")
        .to_rgba8()
}

/// IHDR color type byte (signature 8 + length 4 + type 4 + w 4 + h 4 + depth 1)
fn color_type(png: &[u8]) -> u8 {
    png[25]
}

/// Smooth diagonal gradient with every pixel opaque.
fn gradient_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) % 256) as u8;
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }
    pixels
}

/// Deterministic pseudo-random bytes (xorshift).
fn noise_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    let mut pixels = Vec::with_capacity(width * height * 4);
    for _ in 0..width * height {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [a, b, c, _] = state.to_le_bytes();
        pixels.extend_from_slice(&[a, b, c, 255]);
    }
    pixels
}

fn count_colors(pixels: &[u8]) -> usize {
    pixels
        .chunks_exact(4)
        .map(|p| [p[0], p[1], p[2], p[3]])
        .collect::<HashSet<_>>()
        .len()
}

// ============================================================================
// RGBA encoding
// ============================================================================

#[test]
fn test_fast_rgba_decodes_exactly() {
    let pixels = gradient_pixels(37, 23);
    let png = encode_rgba(&pixels, 37, 23, &PngOptions::fast()).unwrap();

    assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(color_type(&png), 6);

    let decoded = decode(&png);
    assert_eq!(decoded.dimensions(), (37, 23));
    assert_eq!(decoded.as_raw(), &pixels);
}

#[test]
fn test_optimized_rgba_decodes_exactly() {
    // Far more than 256 colors, so this stays RGBA
    let pixels = noise_pixels(64, 48);
    assert!(count_colors(&pixels) > 256);

    let png = encode_rgba(&pixels, 64, 48, &PngOptions::optimized()).unwrap();
    assert_eq!(color_type(&png), 6);
    assert_eq!(decode(&png).as_raw(), &pixels);
}

#[test]
fn test_adaptive_filters_round_trip_gradient() {
    let pixels = gradient_pixels(200, 150);
    let options = PngOptions {
        allow_indexed: false,
        ..PngOptions::optimized()
    };
    let png = create_png(&pixels, 200, 150, &options).unwrap();
    assert_eq!(decode(&png).as_raw(), &pixels);
}

#[test]
fn test_optimized_is_not_larger_on_smooth_data() {
    let pixels = gradient_pixels(256, 256);
    let fast = encode_rgba(&pixels, 256, 256, &PngOptions::fast()).unwrap();
    let optimized = encode_rgba(&pixels, 256, 256, &PngOptions::optimized()).unwrap();
    assert!(
        optimized.len() <= fast.len(),
        "optimized {} > fast {}",
        optimized.len(),
        fast.len()
    );
}

#[test]
fn test_single_pixel() {
    let png = encode_rgba(&[10, 20, 30, 255], 1, 1, &PngOptions::optimized()).unwrap();
    let decoded = decode(&png);
    assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30, 255]);
}

// ============================================================================
// Indexed encoding
// ============================================================================

#[test]
fn test_indexed_with_transparency_decodes() {
    // Half transparent black, half opaque orange
    let mut pixels = Vec::new();
    for y in 0..40 {
        for x in 0..80 {
            if x < 40 {
                pixels.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                pixels.extend_from_slice(&[250, 120, (y * 3) as u8, 255]);
            }
        }
    }
    assert!(count_colors(&pixels) <= 256);

    let png = encode_rgba(&pixels, 80, 40, &PngOptions::optimized()).unwrap();
    assert_eq!(color_type(&png), 3);

    let decoded = decode(&png);
    assert_eq!(decoded.as_raw(), &pixels);
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    assert_eq!(decoded.get_pixel(79, 39).0, [250, 120, 117, 255]);
}

#[test]
fn test_large_indexed_uses_parallel_palette() {
    // 128x128 is above the parallel extraction threshold
    let mut pixels = Vec::with_capacity(128 * 128 * 4);
    for y in 0..128 {
        for x in 0..128 {
            let band = ((x / 16) + (y / 16) * 8) as u8;
            pixels.extend_from_slice(&[band * 3, 255 - band, 64, 255]);
        }
    }
    let png = encode_rgba(&pixels, 128, 128, &PngOptions::optimized()).unwrap();
    assert_eq!(color_type(&png), 3);
    assert_eq!(decode(&png).as_raw(), &pixels);
}

#[test]
fn test_create_png_indexed_rejects_empty_palette() {
    let err = create_png_indexed(1, 1, &[], &[0], &PngOptions::fast()).unwrap_err();
    assert_eq!(err.kind(), "processing");
}

// ============================================================================
// Display image → PNG → data URI
// ============================================================================

#[test]
fn test_grayscale_band_to_data_uri() {
    let raw: Vec<f64> = (0..16).map(|v| v as f64 * 10.0).collect();
    let channels = normalize_bands(&[&raw], NormalizationMode::Global).unwrap();
    let img = DisplayImage::from_channels(&channels, 4, 4, 10).unwrap();

    let uri = img.to_data_uri(&PngOptions::fast()).unwrap();
    let png = decode_png_data_uri(&uri).expect("data URI payload");
    let decoded = decode(&png);

    assert_eq!(decoded.dimensions(), (4, 4));
    // Minimum maps to black and is masked
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
    // Maximum maps to white
    assert_eq!(decoded.get_pixel(3, 3).0, [255, 255, 255, 255]);
    // Gray: R == G == B everywhere
    for px in decoded.pixels() {
        assert_eq!(px.0[0], px.0[1]);
        assert_eq!(px.0[1], px.0[2]);
    }
}

#[test]
fn test_fast_and_optimized_decode_to_same_pixels() {
    let raw_r: Vec<f64> = (0..30 * 20).map(|i| (i % 30) as f64).collect();
    let raw_g: Vec<f64> = (0..30 * 20).map(|i| (i / 30) as f64).collect();
    let channels = normalize_bands(&[&raw_r, &raw_g], NormalizationMode::PerChannel).unwrap();
    let img = DisplayImage::from_channels(&channels, 30, 20, 10).unwrap();

    let fast = decode(&img.to_png(&PngOptions::fast()).unwrap());
    let optimized = decode(&img.to_png(&PngOptions::optimized()).unwrap());
    assert_eq!(fast.as_raw(), optimized.as_raw());
    assert_eq!(fast.as_raw().as_slice(), img.as_bytes());
}
