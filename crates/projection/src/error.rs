//! Error types for projection operations.

use preview_common::PreviewError;
use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid projection parameters: {0}")]
    InvalidParameters(String),

    #[error("Point ({x}, {y}) has no finite geographic position")]
    NonFinite { x: f64, y: f64 },
}

impl From<ProjectionError> for PreviewError {
    fn from(err: ProjectionError) -> Self {
        PreviewError::reprojection(err.to_string())
    }
}
