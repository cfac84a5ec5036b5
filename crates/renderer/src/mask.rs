//! Near-black transparency.
//!
//! Raster previews usually carry a black collar outside the valid footprint
//! (nodata rendered as 0). Pixels whose R, G and B are all below the
//! threshold become fully transparent.

/// Alpha for one pixel: 0 when every channel is below `threshold`, else 255.
///
/// A threshold of 0 never masks.
#[inline]
pub fn alpha_for(rgb: [u8; 3], threshold: u8) -> u8 {
    if rgb.iter().all(|&c| c < threshold) {
        0
    } else {
        255
    }
}

/// Rewrite the alpha channel of an RGBA buffer in place.
pub fn apply_black_mask(rgba: &mut [u8], threshold: u8) -> usize {
    let mut masked = 0;
    for px in rgba.chunks_exact_mut(4) {
        px[3] = alpha_for([px[0], px[1], px[2]], threshold);
        if px[3] == 0 {
            masked += 1;
        }
    }
    masked
}
