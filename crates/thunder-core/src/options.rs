//! Configuration options for thunder-rs.

use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// All editor rendering options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Frame pipeline settings.
    pub pipeline: PipelineOptions,
    /// Transform handle settings.
    pub handles: HandleOptions,
    /// Grid snapping for the editor tools.
    pub snap: SnapOptions,
}

impl Options {
    /// Parses options from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes options to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A stage of the post-processing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostEffectKind {
    /// HDR to display tone mapping.
    ToneMapping,
    /// Screen-space anti-aliasing.
    AntiAliasing,
}

/// Tone mapping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingConfig {
    /// Exposure multiplier (default 1.0).
    pub exposure: f32,
    /// White level for highlight compression (default 1.0).
    pub white_level: f32,
    /// Gamma correction exponent (default 2.2).
    pub gamma: f32,
}

impl Default for ToneMappingConfig {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            white_level: 1.0,
            gamma: 2.2,
        }
    }
}

impl ToneMappingConfig {
    /// Sets the exposure value.
    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    /// Sets the gamma value.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }
}

/// Frame pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Clear color of the main color target.
    pub background_color: Vec4,
    /// Edge length of the square shadow map.
    pub shadow_map_size: u32,
    /// Post effects applied in order by backends that provide them.
    pub post_effects: Vec<PostEffectKind>,
    /// Tone mapping parameters.
    pub tone_mapping: ToneMappingConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            background_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            shadow_map_size: 2048,
            post_effects: Vec::new(),
            tone_mapping: ToneMappingConfig::default(),
        }
    }
}

impl PipelineOptions {
    /// Sets the background color.
    pub fn with_background_color(mut self, color: Vec4) -> Self {
        self.background_color = color;
        self
    }

    /// Sets the shadow map size.
    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size;
        self
    }

    /// Appends a post effect to the chain.
    pub fn with_post_effect(mut self, effect: PostEffectKind) -> Self {
        self.post_effects.push(effect);
        self
    }
}

/// Transform handle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleOptions {
    /// Hit tolerance in normalized screen units.
    pub sense: f32,
    /// Alpha of the translucent plane quads.
    pub alpha: f32,
    /// Gizmo size relative to the pivot distance.
    pub scale: f32,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            sense: 0.02,
            alpha: 0.3,
            scale: 0.2,
        }
    }
}

impl HandleOptions {
    /// Sets the hit tolerance.
    pub fn with_sense(mut self, sense: f32) -> Self {
        self.sense = sense;
        self
    }

    /// Sets the gizmo scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Grid snapping. A step of zero or less disables snapping on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapOptions {
    /// Move grid per axis.
    pub move_grid: Vec3,
    /// Rotation step in degrees.
    pub rotate_step: f32,
    /// Scale step.
    pub scale_step: f32,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            move_grid: Vec3::ZERO,
            rotate_step: 0.0,
            scale_step: 0.0,
        }
    }
}

impl SnapOptions {
    /// Sets the move grid.
    pub fn with_move_grid(mut self, grid: Vec3) -> Self {
        self.move_grid = grid;
        self
    }

    /// Sets the rotation step.
    pub fn with_rotate_step(mut self, degrees: f32) -> Self {
        self.rotate_step = degrees;
        self
    }

    /// Sets the scale step.
    pub fn with_scale_step(mut self, step: f32) -> Self {
        self.scale_step = step;
        self
    }
}
