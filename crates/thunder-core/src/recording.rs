//! A CPU command buffer that records every call.
//!
//! Used by tests and headless tooling. Textures live in host memory so
//! readback works without a device. With coverage enabled, every draw fills
//! the viewport of the bound color target with the current color, which is
//! enough to exercise the picking protocol end to end.

use std::collections::HashMap;

use glam::{Mat4, Vec4};

use crate::command_buffer::{
    CommandBuffer, FrameStats, GlobalValue, Layer, TextureFormat, TextureHandle, Viewport,
};
use crate::mesh::{MaterialInstance, Mesh};

/// A recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRenderTarget {
        color: Option<TextureHandle>,
        depth: Option<TextureHandle>,
    },
    Clear {
        clear_color: bool,
        color: Vec4,
        clear_depth: bool,
        depth: f32,
    },
    SetViewport(Viewport),
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    SetColor(Vec4),
    SetGlobal {
        name: String,
        value: GlobalValue,
    },
    DrawMesh(DrawCall),
    Submit,
}

/// A recorded `draw_mesh` call together with the state it was issued in.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub transform: Mat4,
    pub mesh_id: u64,
    pub mesh_name: String,
    pub surface: usize,
    pub layer: Layer,
    pub color: Vec4,
    pub material: Option<String>,
    pub color_target: Option<TextureHandle>,
    pub depth_target: Option<TextureHandle>,
}

#[derive(Debug, Clone)]
struct CpuTexture {
    label: String,
    format: TextureFormat,
    width: u32,
    height: u32,
    texels: Vec<[u8; 4]>,
    depth: Vec<f32>,
}

impl CpuTexture {
    fn new(label: &str, format: TextureFormat, width: u32, height: u32) -> Self {
        let mut texture = Self {
            label: label.to_string(),
            format,
            width: 0,
            height: 0,
            texels: Vec::new(),
            depth: Vec::new(),
        };
        texture.resize(width, height);
        texture
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let len = width as usize * height as usize;
        if self.format.is_depth() {
            self.depth = vec![1.0; len];
        } else {
            self.texels = vec![[0; 4]; len];
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    fn fill_color(&mut self, rect: Viewport, color: [u8; 4]) {
        for (x, y) in rect_texels(rect, self.width, self.height) {
            if let Some(i) = self.index(x, y) {
                self.texels[i] = color;
            }
        }
    }

    fn fill_depth(&mut self, rect: Viewport, depth: f32) {
        for (x, y) in rect_texels(rect, self.width, self.height) {
            if let Some(i) = self.index(x, y) {
                self.depth[i] = depth;
            }
        }
    }
}

fn rect_texels(rect: Viewport, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    let x1 = (rect.x.max(0) as u32 + rect.width).min(width);
    let y1 = (rect.y.max(0) as u32 + rect.height).min(height);
    (y0..y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
}

/// Converts a normalized color to RGBA8, rounding to the nearest step.
#[must_use]
pub fn color_to_rgba8(color: Vec4) -> [u8; 4] {
    let c = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
}

/// Command buffer backed by host memory.
#[derive(Debug, Default)]
pub struct RecordingCommandBuffer {
    textures: Vec<CpuTexture>,
    commands: Vec<Command>,
    view: Mat4,
    projection: Mat4,
    color: Vec4,
    globals: HashMap<String, GlobalValue>,
    color_target: Option<TextureHandle>,
    depth_target: Option<TextureHandle>,
    viewport: Viewport,
    stats: FrameStats,
    coverage: bool,
    coverage_depth: f32,
}

impl RecordingCommandBuffer {
    /// Creates an empty recording buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            color: Vec4::ONE,
            coverage_depth: 0.5,
            ..Default::default()
        }
    }

    /// Makes every draw fill the viewport of the bound targets.
    #[must_use]
    pub fn with_coverage(mut self, depth: f32) -> Self {
        self.coverage = true;
        self.coverage_depth = depth;
        self
    }

    /// Returns all recorded commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Returns the recorded draw calls in order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            Command::DrawMesh(draw) => Some(draw),
            _ => None,
        })
    }

    /// Returns the current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Returns the label a texture was created with.
    pub fn texture_label(&self, texture: TextureHandle) -> Option<&str> {
        self.texture(texture).map(|t| t.label.as_str())
    }

    /// Returns the bound `(color, depth)` targets.
    pub fn render_target(&self) -> (Option<TextureHandle>, Option<TextureHandle>) {
        (self.color_target, self.depth_target)
    }

    /// Writes one RGBA8 texel (bottom-left origin).
    pub fn write_pixel(&mut self, texture: TextureHandle, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(t) = self.texture_mut(texture) {
            if let Some(i) = t.index(x, y) {
                if !t.format.is_depth() {
                    t.texels[i] = rgba;
                }
            }
        }
    }

    /// Writes one depth texel (bottom-left origin).
    pub fn write_depth(&mut self, texture: TextureHandle, x: u32, y: u32, depth: f32) {
        if let Some(t) = self.texture_mut(texture) {
            if let Some(i) = t.index(x, y) {
                if t.format.is_depth() {
                    t.depth[i] = depth;
                }
            }
        }
    }

    fn texture(&self, texture: TextureHandle) -> Option<&CpuTexture> {
        self.textures.get(texture.index() as usize)
    }

    fn texture_mut(&mut self, texture: TextureHandle) -> Option<&mut CpuTexture> {
        self.textures.get_mut(texture.index() as usize)
    }
}

impl CommandBuffer for RecordingCommandBuffer {
    fn create_texture(
        &mut self,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Option<TextureHandle> {
        let index = u32::try_from(self.textures.len()).ok()?;
        self.textures
            .push(CpuTexture::new(label, format, width, height));
        Some(TextureHandle::new(index))
    }

    fn resize_texture(&mut self, texture: TextureHandle, width: u32, height: u32) {
        if let Some(t) = self.texture_mut(texture) {
            if t.width != width || t.height != height {
                t.resize(width, height);
            }
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.texture(texture).map(|t| (t.width, t.height))
    }

    fn set_render_target(&mut self, color: Option<TextureHandle>, depth: Option<TextureHandle>) {
        self.color_target = color;
        self.depth_target = depth;
        self.commands.push(Command::SetRenderTarget { color, depth });
    }

    fn clear_render_target(&mut self, clear_color: bool, color: Vec4, clear_depth: bool, depth: f32) {
        if clear_color {
            let rgba = color_to_rgba8(color);
            if let Some(t) = self.color_target.and_then(|h| self.textures.get_mut(h.index() as usize)) {
                t.texels.iter_mut().for_each(|texel| *texel = rgba);
            }
        }
        if clear_depth {
            if let Some(t) = self.depth_target.and_then(|h| self.textures.get_mut(h.index() as usize)) {
                t.depth.iter_mut().for_each(|d| *d = depth);
            }
        }
        self.commands.push(Command::Clear {
            clear_color,
            color,
            clear_depth,
            depth,
        });
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        self.commands.push(Command::SetViewport(self.viewport));
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.commands
            .push(Command::SetViewProjection { view, projection });
    }

    fn view(&self) -> Mat4 {
        self.view
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn set_color(&mut self, color: Vec4) {
        self.color = color;
        self.commands.push(Command::SetColor(color));
    }

    fn color(&self) -> Vec4 {
        self.color
    }

    fn set_global_value(&mut self, name: &str, value: GlobalValue) {
        self.globals.insert(name.to_string(), value);
        self.commands.push(Command::SetGlobal {
            name: name.to_string(),
            value,
        });
    }

    fn global_value(&self, name: &str) -> Option<GlobalValue> {
        self.globals.get(name).copied()
    }

    fn draw_mesh(
        &mut self,
        transform: Mat4,
        mesh: &Mesh,
        surface: usize,
        layer: Layer,
        material: Option<&MaterialInstance>,
    ) {
        let Some(primitives) = mesh.surface(surface).map(crate::mesh::Surface::primitive_count)
        else {
            log::trace!("mesh '{}' has no surface {surface}", mesh.name());
            return;
        };
        self.stats.draw_calls += 1;
        self.stats.polygons += primitives as u64;

        if self.coverage {
            let rgba = color_to_rgba8(self.color);
            let rect = self.viewport;
            let depth = self.coverage_depth;
            if let Some(t) = self.color_target.and_then(|h| self.textures.get_mut(h.index() as usize)) {
                t.fill_color(rect, rgba);
            }
            if let Some(t) = self.depth_target.and_then(|h| self.textures.get_mut(h.index() as usize)) {
                t.fill_depth(rect, depth);
            }
        }

        self.commands.push(Command::DrawMesh(DrawCall {
            transform,
            mesh_id: mesh.id(),
            mesh_name: mesh.name().to_string(),
            surface,
            layer,
            color: self.color,
            material: material.map(|m| m.material.name.clone()),
            color_target: self.color_target,
            depth_target: self.depth_target,
        }));
    }

    fn read_pixel(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<[u8; 4]> {
        let t = self.texture(texture)?;
        if t.format.is_depth() {
            return None;
        }
        t.index(x, y).map(|i| t.texels[i])
    }

    fn read_depth(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<f32> {
        let t = self.texture(texture)?;
        if !t.format.is_depth() {
            return None;
        }
        t.index(x, y).map(|i| t.depth[i])
    }

    fn submit(&mut self) {
        self.commands.push(Command::Submit);
    }

    fn stats(&self) -> FrameStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = FrameStats::default();
    }
}
