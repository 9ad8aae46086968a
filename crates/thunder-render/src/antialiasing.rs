//! Screen-space anti-aliasing post effect.

use thunder_core::TextureHandle;

use crate::engine::WgpuCommandBuffer;
use crate::fullscreen::FullscreenPass;
use crate::post_effect::PostEffect;

/// GPU representation of anti-aliasing uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FxaaUniforms {
    pub texel_size: [f32; 2],
    pub edge_threshold: f32,
    pub _padding: f32,
}

impl FxaaUniforms {
    /// Uniforms for a target of the given size.
    #[must_use]
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            edge_threshold: 0.125,
            _padding: 0.0,
        }
    }
}

/// Blurs across high-contrast edges.
pub struct FxaaPass {
    pass: FullscreenPass,
}

impl FxaaPass {
    /// Creates a new anti-aliasing pass.
    pub fn new(buffer: &WgpuCommandBuffer) -> Self {
        let uniforms = FxaaUniforms::for_size(1, 1);
        Self {
            pass: FullscreenPass::new(
                buffer.device(),
                "FXAA Pass",
                include_str!("shaders/fxaa.wgsl"),
                bytemuck::bytes_of(&uniforms),
            ),
        }
    }
}

impl PostEffect<WgpuCommandBuffer> for FxaaPass {
    fn name(&self) -> &str {
        "anti-aliasing"
    }

    fn draw(&mut self, source: TextureHandle, buffer: &mut WgpuCommandBuffer) -> TextureHandle {
        self.pass.draw(source, buffer)
    }

    fn resize(&mut self, buffer: &mut WgpuCommandBuffer, width: u32, height: u32) {
        self.pass.resize(buffer, width, height);
        let uniforms = FxaaUniforms::for_size(width, height);
        self.pass
            .write_uniforms(buffer.queue(), bytemuck::bytes_of(&uniforms));
    }
}
