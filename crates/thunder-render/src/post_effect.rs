//! Post-processing chain stages.

use thunder_core::{CommandBuffer, TextureHandle};

/// A full-screen stage run after the main pass.
///
/// Stages run in registration order; each consumes the previous stage's
/// output and returns the texture it wrote.
pub trait PostEffect<B: CommandBuffer> {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the stage on `source` and returns the result texture.
    fn draw(&mut self, source: TextureHandle, buffer: &mut B) -> TextureHandle;

    /// Resizes internal targets to the screen size.
    fn resize(&mut self, buffer: &mut B, width: u32, height: u32);
}
