//! Rendering for thunder-rs.
//!
//! This crate provides:
//! - [`Pipeline`], the multi-pass frame renderer with GPU object picking
//! - the [`PostEffect`] chain and the wgpu tone mapping and anti-aliasing stages
//! - [`WgpuCommandBuffer`], the wgpu implementation of `CommandBuffer`
//! - shadow-map matrices and saving captured frames to image files

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel math converts between integer and float widths on purpose
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]

pub mod antialiasing;
pub mod engine;
pub mod error;
mod fullscreen;
pub mod pipeline;
pub mod post_effect;
pub mod screenshot;
pub mod shadow_map;
pub mod tone_mapping;

pub use antialiasing::{FxaaPass, FxaaUniforms};
pub use engine::{DrawUniforms, WgpuCommandBuffer};
pub use error::{RenderError, RenderResult};
pub use pipeline::{Pipeline, COLOR_MAP, DEPTH_MAP, SELECT_MAP, SHADOW_MAP};
pub use post_effect::PostEffect;
pub use screenshot::{save_image, save_to_buffer};
pub use shadow_map::{compute_light_matrix, light_view_projection, SHADOW_MAP_SIZE};
pub use tone_mapping::{ToneMapPass, ToneMapUniforms};

use thunder_core::{PipelineOptions, PostEffectKind};

/// Builds the post effects listed in `options` for the wgpu backend.
pub fn build_post_effects(
    buffer: &WgpuCommandBuffer,
    options: &PipelineOptions,
) -> Vec<Box<dyn PostEffect<WgpuCommandBuffer>>> {
    options
        .post_effects
        .iter()
        .map(|kind| -> Box<dyn PostEffect<WgpuCommandBuffer>> {
            match kind {
                PostEffectKind::ToneMapping => Box::new(ToneMapPass::new(buffer, &options.tone_mapping)),
                PostEffectKind::AntiAliasing => Box::new(FxaaPass::new(buffer)),
            }
        })
        .collect()
}
