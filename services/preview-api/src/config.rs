//! Pipeline configuration loading for the service.

use std::path::Path;

use anyhow::{Context, Result};
use raster_preview::PreviewConfig;

/// Load the pipeline configuration.
///
/// Starts from the YAML file when one is given (defaults otherwise), then
/// applies `PREVIEW_*` environment overrides and validates the result.
pub fn load_preview_config(path: Option<&Path>) -> Result<PreviewConfig> {
    let config = match path {
        Some(path) => {
            let config = PreviewConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load pipeline config: {}", path.display()))?;
            tracing::info!(path = %path.display(), "Loaded pipeline config");
            config.with_env_overrides(|key| std::env::var(key).ok())
        }
        None => PreviewConfig::from_env(),
    };

    config.validate().context("Invalid pipeline config")?;
    Ok(config)
}
