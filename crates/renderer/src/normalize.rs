//! Linear stretch of raw samples into 8-bit display values.

use preview_common::{PreviewError, PreviewResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bands larger than this are scanned in parallel.
const PARALLEL_THRESHOLD: usize = 1 << 16;

/// How the min/max used for stretching is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// One min/max across every band, preserving relative brightness.
    #[default]
    Global,
    /// Each band stretched over its own min/max.
    PerChannel,
}

impl std::str::FromStr for NormalizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "global" => Ok(NormalizationMode::Global),
            "per_channel" | "perchannel" => Ok(NormalizationMode::PerChannel),
            other => Err(format!("unknown normalization mode '{}'", other)),
        }
    }
}

/// Min and max of the finite values. `None` if there are none.
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let fold = |(lo, hi): (f64, f64), v: f64| {
        if v.is_finite() {
            (lo.min(v), hi.max(v))
        } else {
            (lo, hi)
        }
    };
    let identity = (f64::INFINITY, f64::NEG_INFINITY);

    let (lo, hi) = if values.len() >= PARALLEL_THRESHOLD {
        values
            .par_iter()
            .fold(|| identity, |acc, &v| fold(acc, v))
            .reduce(|| identity, |a, b| (a.0.min(b.0), a.1.max(b.1)))
    } else {
        values.iter().fold(identity, |acc, &v| fold(acc, v))
    };

    (lo <= hi).then_some((lo, hi))
}

/// Stretch `values` over `[min, max]` into 0..=255.
///
/// `(v - min) / (max - min) * 255`, truncated toward zero. A degenerate range
/// maps everything to 0. Non-finite values map to 0.
pub fn stretch(values: &[f64], min: f64, max: f64) -> Vec<u8> {
    let span = max - min;
    if !(span > 0.0) || !span.is_finite() {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                // `as` saturates at both ends
                ((v - min) / span * 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Normalize every band to 8 bits.
///
/// All bands must have the same length.
pub fn normalize_bands(bands: &[&[f64]], mode: NormalizationMode) -> PreviewResult<Vec<Vec<u8>>> {
    let Some(first) = bands.first() else {
        return Err(PreviewError::normalization("no bands to normalize"));
    };
    if let Some(bad) = bands.iter().position(|b| b.len() != first.len()) {
        return Err(PreviewError::normalization(format!(
            "band {} has {} samples, expected {}",
            bad,
            bands[bad].len(),
            first.len()
        )));
    }

    let out = match mode {
        NormalizationMode::Global => {
            let range = bands.iter().filter_map(|b| value_range(b)).reduce(|a, b| {
                (a.0.min(b.0), a.1.max(b.1))
            });
            let (min, max) = range.unwrap_or((0.0, 0.0));
            debug!(min, max, bands = bands.len(), "Global normalization range");
            bands.par_iter().map(|b| stretch(b, min, max)).collect()
        }
        NormalizationMode::PerChannel => bands
            .par_iter()
            .map(|b| {
                let (min, max) = value_range(b).unwrap_or((0.0, 0.0));
                stretch(b, min, max)
            })
            .collect(),
    };

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_skips_non_finite() {
        assert_eq!(value_range(&[3.0, f64::NAN, -1.0, f64::INFINITY]), Some((-1.0, 3.0)));
        assert_eq!(value_range(&[f64::NAN]), None);
        assert_eq!(value_range(&[]), None);
    }

    #[test]
    fn test_value_range_parallel_matches_sequential() {
        let values: Vec<f64> = (0..PARALLEL_THRESHOLD + 10).map(|i| (i as f64) - 5.0).collect();
        assert_eq!(
            value_range(&values),
            Some((-5.0, (PARALLEL_THRESHOLD + 4) as f64))
        );
    }

    #[test]
    fn test_stretch_truncates() {
        // 0.5 * 255 = 127.5 -> 127
        assert_eq!(stretch(&[0.0, 0.5, 1.0], 0.0, 1.0), vec![0, 127, 255]);
    }

    #[test]
    fn test_stretch_constant_is_zero() {
        assert_eq!(stretch(&[7.0, 7.0], 7.0, 7.0), vec![0, 0]);
    }

    #[test]
    fn test_global_preserves_relative_brightness() {
        let dim = [0.0, 10.0];
        let bright = [90.0, 100.0];
        let out = normalize_bands(&[&dim, &bright], NormalizationMode::Global).unwrap();
        assert_eq!(out[0], vec![0, 25]);
        assert_eq!(out[1], vec![229, 255]);
    }

    #[test]
    fn test_per_channel_stretches_each_band() {
        let dim = [0.0, 10.0];
        let bright = [90.0, 100.0];
        let out = normalize_bands(&[&dim, &bright], NormalizationMode::PerChannel).unwrap();
        assert_eq!(out[0], vec![0, 255]);
        assert_eq!(out[1], vec![0, 255]);
    }

    #[test]
    fn test_constant_band_per_channel() {
        let flat = [5.0, 5.0, 5.0];
        let ramp = [0.0, 1.0, 2.0];
        let out = normalize_bands(&[&flat, &ramp], NormalizationMode::PerChannel).unwrap();
        assert_eq!(out[0], vec![0, 0, 0]);
        assert_eq!(out[1], vec![0, 127, 255]);
    }

    #[test]
    fn test_mismatched_band_lengths() {
        let a = [1.0, 2.0];
        let b = [1.0];
        let err = normalize_bands(&[&a, &b], NormalizationMode::Global).unwrap_err();
        assert_eq!(err.kind(), "processing");
    }

    #[test]
    fn test_no_bands() {
        assert!(normalize_bands(&[], NormalizationMode::Global).is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("global".parse::<NormalizationMode>().unwrap(), NormalizationMode::Global);
        assert_eq!(
            "per-channel".parse::<NormalizationMode>().unwrap(),
            NormalizationMode::PerChannel
        );
        assert!("histogram".parse::<NormalizationMode>().is_err());
    }
}
