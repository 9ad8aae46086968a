//! Rendering error types.

use thiserror::Error;

/// Errors that can occur while setting up the device or reading results back.
///
/// Frame submission itself never fails; backends log and skip instead.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// A texture handle does not name a live texture.
    #[error("unknown texture {0}")]
    UnknownTexture(u32),

    /// Mapping a readback buffer failed.
    #[error("GPU buffer mapping failed")]
    BufferMapFailed,

    /// Pixel data does not match the requested dimensions.
    #[error("invalid image data")]
    InvalidImageData,

    /// The output file extension is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
