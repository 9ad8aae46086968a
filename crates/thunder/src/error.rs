//! Error type of the facade crate.

use thiserror::Error;
use thunder_core::ThunderError;
use thunder_render::RenderError;

/// Errors surfaced by the session and headless helpers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or resource error.
    #[error(transparent)]
    Core(#[from] ThunderError),

    /// Device creation, readback or image encoding error.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A specialized Result type for the facade.
pub type Result<T> = std::result::Result<T, Error>;
