//! Error types for the raster preview pipeline.

use thiserror::Error;

/// Result type alias using PreviewError.
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Primary error type for preview operations.
///
/// The two variants separate "the input is not a raster we can read" from
/// "the raster was read but a later stage failed". The HTTP boundary reports
/// both the same way; the distinction is kept for logs and metrics.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// The input bytes could not be read as a supported raster.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to decode TIFF: {0}")]
    Tiff(String),

    #[error("Invalid georeferencing: {0}")]
    Georeference(String),

    #[error("Unsupported raster: {0}")]
    Unsupported(String),
}

/// A stage after decoding failed.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error("Normalization failed: {0}")]
    Normalization(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl PreviewError {
    pub fn tiff(msg: impl Into<String>) -> Self {
        Self::Decode(DecodeError::Tiff(msg.into()))
    }

    pub fn georeference(msg: impl Into<String>) -> Self {
        Self::Decode(DecodeError::Georeference(msg.into()))
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Decode(DecodeError::Unsupported(msg.into()))
    }

    pub fn reprojection(msg: impl Into<String>) -> Self {
        Self::Processing(ProcessingError::Reprojection(msg.into()))
    }

    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Processing(ProcessingError::Normalization(msg.into()))
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Processing(ProcessingError::Encoding(msg.into()))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PreviewError::Decode(_) => "decode",
            PreviewError::Processing(_) => "processing",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Both kinds surface as a server error.
    pub fn http_status_code(&self) -> u16 {
        500
    }
}
