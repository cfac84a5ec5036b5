//! Assembly of normalized bands into an RGBA display image.

use preview_common::{PreviewError, PreviewResult};

use crate::data_uri::png_data_uri;
use crate::mask::apply_black_mask;
use crate::png::{encode_rgba, PngOptions};

/// An RGBA8 image, row-major, ready for PNG encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl DisplayImage {
    /// Build an image from up to three 8-bit channels.
    ///
    /// - one channel is replicated into R, G and B (grayscale)
    /// - two channels fill R and G, B stays 0
    /// - extra channels beyond the third are ignored
    ///
    /// Alpha starts opaque; pixels whose R, G and B are all below
    /// `black_threshold` become transparent.
    pub fn from_channels(
        channels: &[Vec<u8>],
        width: usize,
        height: usize,
        black_threshold: u8,
    ) -> PreviewResult<Self> {
        let n = width * height;
        if n == 0 {
            return Err(PreviewError::encoding(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }
        if let Some(bad) = channels.iter().position(|c| c.len() != n) {
            return Err(PreviewError::encoding(format!(
                "channel {} has {} values, expected {}",
                bad,
                channels[bad].len(),
                n
            )));
        }

        let (r, g, b): (&[u8], &[u8], Option<&[u8]>) = match channels {
            [gray] => (gray.as_slice(), gray.as_slice(), Some(gray.as_slice())),
            [r, g] => (r.as_slice(), g.as_slice(), None),
            [r, g, b, ..] => (r.as_slice(), g.as_slice(), Some(b.as_slice())),
            [] => return Err(PreviewError::encoding("no channels to assemble")),
        };

        let mut pixels = Vec::with_capacity(n * 4);
        for i in 0..n {
            pixels.extend_from_slice(&[r[i], g[i], b.map_or(0, |b| b[i]), 255]);
        }
        apply_black_mask(&mut pixels, black_threshold);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// RGBA of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn transparent_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] == 0).count()
    }

    pub fn to_png(&self, options: &PngOptions) -> PreviewResult<Vec<u8>> {
        encode_rgba(&self.pixels, self.width, self.height, options)
    }

    /// Encode as PNG and wrap in a `data:image/png;base64,` URI.
    pub fn to_data_uri(&self, options: &PngOptions) -> PreviewResult<String> {
        self.to_png(options).map(|png| png_data_uri(&png))
    }
}
