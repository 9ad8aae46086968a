//! The draw submission surface shared by the pipeline and the handles.
//!
//! A [`CommandBuffer`] hides the graphics device: the frame pipeline and
//! the transform handles only talk to this trait, so the same code drives the
//! wgpu backend in `thunder-render` and the [`RecordingCommandBuffer`] used in
//! tests and headless tooling.
//!
//! [`RecordingCommandBuffer`]: crate::recording::RecordingCommandBuffer

use std::ops::{BitOr, BitOrAssign};

use glam::{Mat4, Vec3, Vec4};

use crate::mesh::{MaterialInstance, Mesh};

/// Opaque handle to a backend texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// Wraps a raw backend index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw backend index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Pixel format of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA, used for color and pick targets.
    Rgba8,
    /// 32-bit float depth.
    Depth32,
}

impl TextureFormat {
    /// Returns true for depth formats.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth32)
    }
}

/// Render layer and draw flags.
///
/// The pipeline passes one layer per traversal; components decide whether
/// they take part. The same bits double as draw flags on `draw_mesh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Layer(u32);

impl Layer {
    /// Opaque scene geometry.
    pub const DEFAULT: Self = Self(1 << 0);
    /// Object-id picking pass.
    pub const RAYCAST: Self = Self(1 << 1);
    /// Shadow caster pass.
    pub const SHADOWCAST: Self = Self(1 << 2);
    /// Alpha-blended geometry.
    pub const TRANSLUCENT: Self = Self(1 << 3);
    /// Overlays and editor gizmos.
    pub const UI: Self = Self(1 << 4);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Layer {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Layer {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A value bound to a named global shader slot (`"camera.position"`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalValue {
    /// Scalar.
    Float(f32),
    /// Three-component vector.
    Vec3(Vec3),
    /// Four-component vector.
    Vec4(Vec4),
    /// 4x4 matrix.
    Mat4(Mat4),
}

impl From<f32> for GlobalValue {
    fn from(value: f32) -> Self {
        GlobalValue::Float(value)
    }
}

impl From<Vec3> for GlobalValue {
    fn from(value: Vec3) -> Self {
        GlobalValue::Vec3(value)
    }
}

impl From<Vec4> for GlobalValue {
    fn from(value: Vec4) -> Self {
        GlobalValue::Vec4(value)
    }
}

impl From<Mat4> for GlobalValue {
    fn from(value: Mat4) -> Self {
        GlobalValue::Mat4(value)
    }
}

/// Per-frame submission counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Number of `draw_mesh` calls.
    pub draw_calls: u32,
    /// Number of primitives submitted.
    pub polygons: u64,
}

/// Viewport rectangle in framebuffer pixels (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Draw submission surface.
///
/// Framebuffer coordinates (viewport and readback) use a bottom-left origin;
/// callers holding top-left cursor coordinates flip Y first.
pub trait CommandBuffer {
    /// Creates a render target texture. Returns `None` when the backend
    /// cannot allocate it.
    fn create_texture(
        &mut self,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Option<TextureHandle>;

    /// Reallocates a texture at a new size. Contents are undefined afterwards.
    fn resize_texture(&mut self, texture: TextureHandle, width: u32, height: u32);

    /// Returns the size of a texture.
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    /// Binds the color and depth attachments for subsequent draws.
    fn set_render_target(&mut self, color: Option<TextureHandle>, depth: Option<TextureHandle>);

    /// Clears the bound attachments.
    fn clear_render_target(&mut self, clear_color: bool, color: Vec4, clear_depth: bool, depth: f32);

    /// Sets the viewport rectangle.
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Sets the view and projection matrices for subsequent draws.
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);

    /// Returns the current view matrix.
    fn view(&self) -> Mat4;

    /// Returns the current projection matrix.
    fn projection(&self) -> Mat4;

    /// Sets the flat color for subsequent draws.
    fn set_color(&mut self, color: Vec4);

    /// Returns the current flat color.
    fn color(&self) -> Vec4;

    /// Binds a named global value.
    fn set_global_value(&mut self, name: &str, value: GlobalValue);

    /// Returns a named global value.
    fn global_value(&self, name: &str) -> Option<GlobalValue>;

    /// Draws one surface of a mesh.
    fn draw_mesh(
        &mut self,
        transform: Mat4,
        mesh: &Mesh,
        surface: usize,
        layer: Layer,
        material: Option<&MaterialInstance>,
    );

    /// Reads one RGBA8 texel. Blocks until the device has finished.
    fn read_pixel(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<[u8; 4]>;

    /// Reads one depth texel. Blocks until the device has finished.
    fn read_depth(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<f32>;

    /// Flushes recorded work to the device.
    fn submit(&mut self);

    /// Returns the counters accumulated since the last reset.
    fn stats(&self) -> FrameStats;

    /// Resets the counters.
    fn reset_stats(&mut self);
}
