//! Error types for thunder-rs.

use thiserror::Error;

/// The main error type for thunder-rs core operations.
///
/// Frame operations (drawing, picking, handle interaction) never fail; missing
/// cameras, controllers or resources are skipped instead. Errors are reserved
/// for configuration and resource setup.
#[derive(Error, Debug)]
pub enum ThunderError {
    /// A render target or texture was requested with a zero dimension.
    #[error("invalid dimension {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// A resource could not be found at the given path.
    #[error("resource '{0}' not found")]
    ResourceNotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for thunder-rs operations.
pub type Result<T> = std::result::Result<T, ThunderError>;
