//! Tone mapping post effect.

use thunder_core::{TextureHandle, ToneMappingConfig};

use crate::engine::WgpuCommandBuffer;
use crate::fullscreen::FullscreenPass;
use crate::post_effect::PostEffect;

/// GPU representation of tone mapping uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ToneMapUniforms {
    pub exposure: f32,
    pub white_level: f32,
    pub gamma: f32,
    pub _padding: f32,
}

impl From<&ToneMappingConfig> for ToneMapUniforms {
    fn from(config: &ToneMappingConfig) -> Self {
        Self {
            exposure: config.exposure,
            white_level: config.white_level.max(1e-4),
            gamma: config.gamma.max(1e-4),
            _padding: 0.0,
        }
    }
}

impl Default for ToneMapUniforms {
    fn default() -> Self {
        Self::from(&ToneMappingConfig::default())
    }
}

/// Maps the main color target to display range.
pub struct ToneMapPass {
    pass: FullscreenPass,
}

impl ToneMapPass {
    /// Creates a new tone mapping pass.
    pub fn new(buffer: &WgpuCommandBuffer, config: &ToneMappingConfig) -> Self {
        let uniforms = ToneMapUniforms::from(config);
        Self {
            pass: FullscreenPass::new(
                buffer.device(),
                "Tone Map Pass",
                include_str!("shaders/tone_map.wgsl"),
                bytemuck::bytes_of(&uniforms),
            ),
        }
    }

    /// Updates the tone mapping uniforms.
    pub fn update_uniforms(&self, buffer: &WgpuCommandBuffer, config: &ToneMappingConfig) {
        let uniforms = ToneMapUniforms::from(config);
        self.pass
            .write_uniforms(buffer.queue(), bytemuck::bytes_of(&uniforms));
    }

    /// The texture the pass writes, once allocated.
    pub fn output(&self) -> Option<TextureHandle> {
        self.pass.output()
    }
}

impl PostEffect<WgpuCommandBuffer> for ToneMapPass {
    fn name(&self) -> &str {
        "tone mapping"
    }

    fn draw(&mut self, source: TextureHandle, buffer: &mut WgpuCommandBuffer) -> TextureHandle {
        self.pass.draw(source, buffer)
    }

    fn resize(&mut self, buffer: &mut WgpuCommandBuffer, width: u32, height: u32) {
        self.pass.resize(buffer, width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_from_config() {
        let config = ToneMappingConfig::default().with_exposure(1.5).with_gamma(2.0);
        let uniforms = ToneMapUniforms::from(&config);
        assert_eq!(uniforms.exposure, 1.5);
        assert_eq!(uniforms.gamma, 2.0);
        assert_eq!(std::mem::size_of::<ToneMapUniforms>(), 16);
    }

    #[test]
    fn test_zero_gamma_is_clamped() {
        let config = ToneMappingConfig::default().with_gamma(0.0);
        assert!(ToneMapUniforms::from(&config).gamma > 0.0);
    }
}
