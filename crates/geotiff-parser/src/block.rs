//! Band-major pixel blocks.

use num_traits::ToPrimitive;
use preview_common::{PreviewError, PreviewResult};

/// Sample type of the source raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleType {
    /// Derive from TIFF `SampleFormat` (1 uint, 2 int, 3 float) and bit depth.
    pub fn from_tiff(sample_format: u32, bits: u32) -> Option<Self> {
        match (sample_format, bits) {
            (1, 8) => Some(SampleType::U8),
            (1, 16) => Some(SampleType::U16),
            (1, 32) => Some(SampleType::U32),
            (1, 64) => Some(SampleType::U64),
            (2, 8) => Some(SampleType::I8),
            (2, 16) => Some(SampleType::I16),
            (2, 32) => Some(SampleType::I32),
            (2, 64) => Some(SampleType::I64),
            (3, 32) => Some(SampleType::F32),
            (3, 64) => Some(SampleType::F64),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::U8 => "uint8",
            SampleType::U16 => "uint16",
            SampleType::U32 => "uint32",
            SampleType::U64 => "uint64",
            SampleType::I8 => "int8",
            SampleType::I16 => "int16",
            SampleType::I32 => "int32",
            SampleType::I64 => "int64",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        }
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pixel samples laid out as bands × rows × columns.
///
/// Values are widened to `f64`; `sample_type` records what the raster
/// actually stores.
#[derive(Debug, Clone)]
pub struct PixelBlock {
    bands: usize,
    rows: usize,
    cols: usize,
    sample_type: SampleType,
    data: Vec<f64>,
}

impl PixelBlock {
    /// Create a block from band-major data.
    pub fn new(
        bands: usize,
        rows: usize,
        cols: usize,
        sample_type: SampleType,
        data: Vec<f64>,
    ) -> PreviewResult<Self> {
        if data.len() != bands * rows * cols {
            return Err(PreviewError::tiff(format!(
                "pixel block holds {} samples, expected {} ({} bands × {} × {})",
                data.len(),
                bands * rows * cols,
                bands,
                rows,
                cols
            )));
        }
        Ok(Self {
            bands,
            rows,
            cols,
            sample_type,
            data,
        })
    }

    /// Resample pixel-interleaved samples into a band-major block.
    ///
    /// Nearest neighbour: each output pixel takes the source pixel under its
    /// centre. With `out_rows == rows` and `out_cols == cols` this is a plain
    /// de-interleave.
    #[allow(clippy::too_many_arguments)]
    pub fn from_interleaved<T: Copy + ToPrimitive>(
        samples: &[T],
        bands: usize,
        rows: usize,
        cols: usize,
        out_rows: usize,
        out_cols: usize,
        sample_type: SampleType,
    ) -> PreviewResult<Self> {
        if samples.len() != bands * rows * cols {
            return Err(PreviewError::tiff(format!(
                "decoded {} samples, expected {} for {} bands of {} × {}",
                samples.len(),
                bands * rows * cols,
                bands,
                cols,
                rows
            )));
        }

        let src_rows = nearest_indices(rows, out_rows);
        let src_cols = nearest_indices(cols, out_cols);
        let plane = out_rows * out_cols;
        let mut data = vec![0.0; bands * plane];

        for (out_r, &src_r) in src_rows.iter().enumerate() {
            for (out_c, &src_c) in src_cols.iter().enumerate() {
                let src = (src_r * cols + src_c) * bands;
                let dst = out_r * out_cols + out_c;
                for band in 0..bands {
                    data[band * plane + dst] = samples[src + band].to_f64().unwrap_or(f64::NAN);
                }
            }
        }

        Self::new(bands, out_rows, out_cols, sample_type, data)
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// All samples, band-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Samples of one band in row-major order.
    pub fn band(&self, index: usize) -> &[f64] {
        let plane = self.rows * self.cols;
        &self.data[index * plane..(index + 1) * plane]
    }

    /// Value at (band, row, col).
    pub fn get(&self, band: usize, row: usize, col: usize) -> f64 {
        self.data[(band * self.rows + row) * self.cols + col]
    }

    /// Replace NaN and infinities with zero. Returns how many were replaced.
    pub fn replace_non_finite(&mut self) -> usize {
        let mut replaced = 0;
        for value in self.data.iter_mut() {
            if !value.is_finite() {
                *value = 0.0;
                replaced += 1;
            }
        }
        replaced
    }

    /// Keep at most the first `max_bands` bands.
    pub fn truncate_bands(&mut self, max_bands: usize) {
        if self.bands > max_bands {
            self.data.truncate(max_bands * self.rows * self.cols);
            self.bands = max_bands;
        }
    }
}

/// Source index for each of `out_len` output positions over `src_len` inputs.
fn nearest_indices(src_len: usize, out_len: usize) -> Vec<usize> {
    let ratio = src_len as f64 / out_len as f64;
    (0..out_len)
        .map(|i| (((i as f64 + 0.5) * ratio) as usize).min(src_len - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        // 2 × 2 RGB
        let samples: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let block =
            PixelBlock::from_interleaved(&samples, 3, 2, 2, 2, 2, SampleType::U8).unwrap();

        assert_eq!(block.band(0), &[1.0, 4.0, 7.0, 10.0]);
        assert_eq!(block.band(1), &[2.0, 5.0, 8.0, 11.0]);
        assert_eq!(block.band(2), &[3.0, 6.0, 9.0, 12.0]);
        assert_eq!(block.get(2, 1, 0), 9.0);
    }

    #[test]
    fn test_decimate_picks_center_pixels() {
        // 1 band, 4 × 4, value = row * 10 + col
        let samples: Vec<u16> = (0..4)
            .flat_map(|r| (0..4).map(move |c| r * 10 + c))
            .collect();
        let block =
            PixelBlock::from_interleaved(&samples, 1, 4, 4, 2, 2, SampleType::U16).unwrap();

        // Output pixel centres fall on source rows/cols 1 and 3
        assert_eq!(block.band(0), &[11.0, 13.0, 31.0, 33.0]);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let samples = [0u8; 5];
        assert!(PixelBlock::from_interleaved(&samples, 1, 2, 3, 2, 3, SampleType::U8).is_err());
    }

    #[test]
    fn test_replace_non_finite() {
        let mut block = PixelBlock::new(
            1,
            1,
            4,
            SampleType::F32,
            vec![1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY],
        )
        .unwrap();
        assert_eq!(block.replace_non_finite(), 3);
        assert_eq!(block.data(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_truncate_bands() {
        let mut block =
            PixelBlock::new(4, 1, 2, SampleType::U8, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0])
                .unwrap();
        block.truncate_bands(3);
        assert_eq!(block.bands(), 3);
        assert_eq!(block.data(), &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);

        block.truncate_bands(5);
        assert_eq!(block.bands(), 3);
    }

    #[test]
    fn test_sample_type_from_tiff() {
        assert_eq!(SampleType::from_tiff(1, 8), Some(SampleType::U8));
        assert_eq!(SampleType::from_tiff(3, 32), Some(SampleType::F32));
        assert!(SampleType::from_tiff(3, 16).is_none());
        assert!(SampleType::F64.is_float());
        assert!(!SampleType::I16.is_float());
    }
}
