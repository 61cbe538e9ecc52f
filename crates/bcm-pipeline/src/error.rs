//! Error types for the projection pipeline.

use thiserror::Error;

/// Errors that can occur while fetching and transforming projection rasters.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("Invalid raster input: {0}")]
    FormatError(String),

    #[error("Reprojection failed: {0}")]
    TransformError(String),

    #[error("Clip to boundary failed: {0}")]
    ClipError(String),

    #[error("Band index {0} is outside 1..=12")]
    InvalidBandIndex(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        Self::FetchFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
