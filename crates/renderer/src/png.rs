//! PNG encoding for RGBA image data.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when allowed and the image has
//!   ≤256 unique colors. Produces smaller files.
//! - **RGBA PNG (color type 6)**: Always available.
//!
//! Scanlines are either written unfiltered (fast) or with a per-row adaptive
//! filter choice using the minimum-sum-of-absolute-differences heuristic.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use preview_common::{PreviewError, PreviewResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngOptions {
    pub compression: Compression,
    /// Choose a filter per scanline instead of always using None.
    pub adaptive_filter: bool,
    /// Emit a palette image when the colors fit.
    pub allow_indexed: bool,
}

impl PngOptions {
    /// Fast deflate, no filtering, always RGBA.
    pub fn fast() -> Self {
        Self {
            compression: Compression::fast(),
            adaptive_filter: false,
            allow_indexed: false,
        }
    }

    /// Best deflate, adaptive filtering, indexed when possible.
    pub fn optimized() -> Self {
        Self {
            compression: Compression::best(),
            adaptive_filter: true,
            allow_indexed: true,
        }
    }
}

impl Default for PngOptions {
    fn default() -> Self {
        Self::fast()
    }
}

/// Encode RGBA pixels, picking indexed or RGBA output per `options`.
///
/// # Arguments
/// - `pixels`: RGBA pixel data (4 bytes per pixel), row-major
/// - `width`: Image width in pixels
/// - `height`: Image height in pixels
pub fn encode_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: &PngOptions,
) -> PreviewResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(PreviewError::encoding(format!(
            "cannot encode a {}x{} image",
            width, height
        )));
    }
    if pixels.len() != width * height * 4 {
        return Err(PreviewError::encoding(format!(
            "expected {} RGBA bytes for {}x{}, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }

    if options.allow_indexed {
        let palette_result = if width * height >= PARALLEL_THRESHOLD {
            extract_palette_parallel(pixels)
        } else {
            extract_palette_sequential(pixels)
        };
        if let Some((palette, indices)) = palette_result {
            return create_png_indexed(width, height, &palette, &indices, options);
        }
    }

    create_png(pixels, width, height, options)
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    (
        packed as u8,
        (packed >> 8) as u8,
        (packed >> 16) as u8,
        (packed >> 24) as u8,
    )
}

/// Sequential palette extraction for small images.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// Collects unique colors per chunk, merges them, then maps every pixel to
/// its palette index in a second parallel pass.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<(u8, u8, u8, u8)>, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_pixels * 4)
        .flat_map_iter(|chunk| {
            let mut local: HashSet<u32> = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(4) {
                local.insert(pack_color(pixel[0], pixel[1], pixel[2], pixel[3]));
                // Early exit if we definitely have too many colors
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_iter()
        })
        .collect();

    let mut global: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<(u8, u8, u8, u8)> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique_colors {
        if !global.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|p| global.get(&pack_color(p[0], p[1], p[2], p[3])).copied())
        .collect::<Option<Vec<u8>>>()?;

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
    options: &PngOptions,
) -> PreviewResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(PreviewError::encoding(format!(
            "palette must hold 1..=256 colors, got {}",
            palette.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // tRNS only if any palette entry is not opaque
    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height, 1, options)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create an RGBA PNG (color type 6).
pub fn create_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: &PngOptions,
) -> PreviewResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(pixels, width, height, 4, options)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Write a PNG chunk: length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Filter and deflate raw image bytes for the IDAT chunk.
fn deflate_scanlines(
    raw: &[u8],
    width: usize,
    height: usize,
    bpp: usize,
    options: &PngOptions,
) -> PreviewResult<Vec<u8>> {
    let stride = width * bpp;
    let filtered = if options.adaptive_filter {
        filter_adaptive(raw, stride, height, bpp)
    } else {
        let mut out = Vec::with_capacity(height * (1 + stride));
        for row in raw.chunks_exact(stride).take(height) {
            out.push(FilterType::None as u8);
            out.extend_from_slice(row);
        }
        out
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), options.compression);
    encoder
        .write_all(&filtered)
        .map_err(|e| PreviewError::encoding(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PreviewError::encoding(format!("IDAT compression failed: {}", e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

const FILTERS: [FilterType; 5] = [
    FilterType::None,
    FilterType::Sub,
    FilterType::Up,
    FilterType::Average,
    FilterType::Paeth,
];

/// Filter every row with whichever filter minimises the sum of absolute
/// (signed) residuals. Rows only depend on unfiltered input, so they are
/// filtered in parallel.
fn filter_adaptive(raw: &[u8], stride: usize, height: usize, bpp: usize) -> Vec<u8> {
    let rows: Vec<Vec<u8>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let row = &raw[y * stride..(y + 1) * stride];
            let prev = (y > 0).then(|| &raw[(y - 1) * stride..y * stride]);

            let mut best: Option<(u64, Vec<u8>)> = None;
            for filter in FILTERS {
                let candidate = apply_filter(filter, row, prev, bpp);
                let score: u64 = candidate[1..]
                    .iter()
                    .map(|&b| (b as i8).unsigned_abs() as u64)
                    .sum();
                if best.as_ref().map_or(true, |(s, _)| score < *s) {
                    best = Some((score, candidate));
                }
            }
            best.map(|(_, row)| row).unwrap_or_default()
        })
        .collect();

    rows.concat()
}

/// Filter byte followed by the filtered row.
fn apply_filter(filter: FilterType, row: &[u8], prev: Option<&[u8]>, bpp: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + 1);
    out.push(filter as u8);

    for i in 0..row.len() {
        let a = if i >= bpp { row[i - bpp] } else { 0 };
        let b = prev.map_or(0, |p| p[i]);
        let c = if i >= bpp { prev.map_or(0, |p| p[i - bpp]) } else { 0 };

        let predicted = match filter {
            FilterType::None => 0,
            FilterType::Sub => a,
            FilterType::Up => b,
            FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
            FilterType::Paeth => paeth(a, b, c),
        };
        out.push(row[i].wrapping_sub(predicted));
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
