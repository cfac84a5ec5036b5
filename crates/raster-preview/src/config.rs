//! Configuration for the preview pipeline.

use std::path::Path;

use renderer::NormalizationMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted downsample factor.
pub const MAX_DOWNSAMPLE_FACTOR: usize = 100;

/// Bands that reach the display image (R, G, B).
pub const MAX_DISPLAY_BANDS: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Integer decimation factor applied to both axes.
    pub downsample_factor: usize,

    /// Bands beyond this are dropped before normalization. At most 3.
    pub max_bands: usize,

    /// Pixels with R, G and B all below this become transparent. 0 disables.
    pub black_threshold: u8,

    /// Best compression, adaptive filters and indexed PNG when possible.
    pub optimize_encoding: bool,

    pub normalization: NormalizationMode,

    /// Cap on the decoder's image buffer in megabytes.
    pub max_decoded_mb: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 10,
            max_bands: 3,
            black_threshold: 10,
            optimize_encoding: false,
            normalization: NormalizationMode::Global,
            max_decoded_mb: 1024,
        }
    }
}

impl PreviewConfig {
    /// Defaults overridden by `PREVIEW_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a YAML document. Missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `PREVIEW_*` overrides read through `lookup`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PREVIEW_DOWNSAMPLE_FACTOR") {
            match val.parse() {
                Ok(factor) => self.downsample_factor = factor,
                Err(_) => warn_ignored("PREVIEW_DOWNSAMPLE_FACTOR", &val),
            }
        }

        if let Some(val) = lookup("PREVIEW_MAX_BANDS") {
            match val.parse() {
                Ok(bands) => self.max_bands = bands,
                Err(_) => warn_ignored("PREVIEW_MAX_BANDS", &val),
            }
        }

        if let Some(val) = lookup("PREVIEW_BLACK_THRESHOLD") {
            match val.parse() {
                Ok(threshold) => self.black_threshold = threshold,
                Err(_) => warn_ignored("PREVIEW_BLACK_THRESHOLD", &val),
            }
        }

        if let Some(val) = lookup("PREVIEW_OPTIMIZE_ENCODING") {
            self.optimize_encoding = val.to_lowercase() == "true" || val == "1";
        }

        if let Some(val) = lookup("PREVIEW_NORMALIZATION") {
            match val.parse() {
                Ok(mode) => self.normalization = mode,
                Err(_) => warn_ignored("PREVIEW_NORMALIZATION", &val),
            }
        }

        if let Some(val) = lookup("PREVIEW_MAX_DECODED_MB") {
            match val.parse() {
                Ok(mb) => self.max_decoded_mb = mb,
                Err(_) => warn_ignored("PREVIEW_MAX_DECODED_MB", &val),
            }
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.downsample_factor == 0 || self.downsample_factor > MAX_DOWNSAMPLE_FACTOR {
            return Err(ConfigError::Invalid(format!(
                "downsample_factor must be 1-{}, got {}",
                MAX_DOWNSAMPLE_FACTOR, self.downsample_factor
            )));
        }

        if self.max_bands == 0 || self.max_bands > MAX_DISPLAY_BANDS {
            return Err(ConfigError::Invalid(format!(
                "max_bands must be 1-{}, got {}",
                MAX_DISPLAY_BANDS, self.max_bands
            )));
        }

        if self.max_decoded_mb == 0 {
            return Err(ConfigError::Invalid("max_decoded_mb must be > 0".to_string()));
        }

        Ok(())
    }

    /// Decoder buffer cap in bytes.
    pub fn max_decoded_bytes(&self) -> usize {
        self.max_decoded_mb.saturating_mul(1024 * 1024)
    }
}

fn warn_ignored(key: &str, value: &str) {
    tracing::warn!(key, value, "Ignoring unparseable environment override");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert_eq!(config.downsample_factor, 10);
        assert_eq!(config.max_bands, 3);
        assert_eq!(config.black_threshold, 10);
        assert!(!config.optimize_encoding);
        assert_eq!(config.normalization, NormalizationMode::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = PreviewConfig::default().with_env_overrides(env(&[
            ("PREVIEW_DOWNSAMPLE_FACTOR", "4"),
            ("PREVIEW_BLACK_THRESHOLD", "0"),
            ("PREVIEW_OPTIMIZE_ENCODING", "true"),
            ("PREVIEW_NORMALIZATION", "per_channel"),
            ("PREVIEW_MAX_DECODED_MB", "64"),
        ]));
        assert_eq!(config.downsample_factor, 4);
        assert_eq!(config.black_threshold, 0);
        assert!(config.optimize_encoding);
        assert_eq!(config.normalization, NormalizationMode::PerChannel);
        assert_eq!(config.max_decoded_bytes(), 64 * 1024 * 1024);
        assert_eq!(config.max_bands, 3);
    }

    #[test]
    fn test_env_bad_values_ignored() {
        let config = PreviewConfig::default().with_env_overrides(env(&[
            ("PREVIEW_DOWNSAMPLE_FACTOR", "ten"),
            ("PREVIEW_BLACK_THRESHOLD", "300"),
            ("PREVIEW_NORMALIZATION", "histogram"),
        ]));
        assert_eq!(config, PreviewConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PreviewConfig::from_yaml_str("downsample_factor: 5\nnormalization: per_channel\n")
            .unwrap();
        assert_eq!(config.downsample_factor, 5);
        assert_eq!(config.normalization, NormalizationMode::PerChannel);
        assert_eq!(config.black_threshold, 10);
    }

    #[test]
    fn test_yaml_parse_error() {
        let err = PreviewConfig::from_yaml_str("downsample_factor: [1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_yaml_file() {
        let file = test_utils::write_temp_file(
            b"max_bands: 1\nblack_threshold: 0\noptimize_encoding: true\n",
            ".yaml",
        );

        let config = PreviewConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.max_bands, 1);
        assert_eq!(config.black_threshold, 0);
        assert!(config.optimize_encoding);
        assert_eq!(config.downsample_factor, 10);
    }

    #[test]
    fn test_missing_file() {
        let err = PreviewConfig::from_yaml_file("/nonexistent/preview.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = PreviewConfig::default();
        config.downsample_factor = 0;
        assert!(config.validate().is_err());

        config.downsample_factor = MAX_DOWNSAMPLE_FACTOR + 1;
        assert!(config.validate().is_err());

        config.downsample_factor = 1;
        config.max_bands = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_more_than_three_bands() {
        let mut config = PreviewConfig::default();
        config.max_bands = MAX_DISPLAY_BANDS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_bands"));

        config.max_bands = MAX_DISPLAY_BANDS;
        assert!(config.validate().is_ok());
    }
}
