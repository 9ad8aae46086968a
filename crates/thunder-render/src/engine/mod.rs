//! The wgpu command buffer.
//!
//! Draws are batched per render target and encoded into a single render pass
//! when the target changes, when a readback needs finished results, or on
//! [`CommandBuffer::submit`]. Framebuffer coordinates arriving through the
//! trait use a bottom-left origin and are flipped to wgpu's top-left origin
//! here.

mod pipelines;
mod readback;
mod textures;

use std::collections::HashMap;

use glam::{Mat4, Vec4};
use thunder_core::{
    CommandBuffer, FrameStats, GlobalValue, Layer, MaterialInstance, Mesh, Surface, TextureFormat,
    TextureHandle, Viewport,
};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
pub use pipelines::DrawUniforms;
use pipelines::{FlatPipelines, PipelineKey};
use textures::{wgpu_format, GpuTexture};

struct GpuSurface {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    mode: thunder_core::PrimitiveMode,
    used: bool,
}

impl GpuSurface {
    fn upload(device: &wgpu::Device, mesh_name: &str, surface: &Surface) -> Self {
        let positions: Vec<[f32; 3]> = surface.vertices.iter().map(|v| v.to_array()).collect();
        let indices = surface.resolved_indices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(mesh_name),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(mesh_name),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            mode: surface.mode,
            used: true,
        }
    }
}

struct PendingDraw {
    surface: (u64, usize),
    key: PipelineKey,
    bind_group: wgpu::BindGroup,
    viewport: Viewport,
}

#[derive(Default)]
struct PendingPass {
    color: Option<TextureHandle>,
    depth: Option<TextureHandle>,
    clear_color: Option<Vec4>,
    clear_depth: Option<f32>,
    draws: Vec<PendingDraw>,
}

impl PendingPass {
    fn is_empty(&self) -> bool {
        self.draws.is_empty() && self.clear_color.is_none() && self.clear_depth.is_none()
    }
}

/// [`CommandBuffer`] implementation on top of a wgpu device.
pub struct WgpuCommandBuffer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: Vec<GpuTexture>,
    pipelines: FlatPipelines,
    meshes: HashMap<(u64, usize), GpuSurface>,
    staging_buffer: wgpu::Buffer,
    pass: PendingPass,
    view: Mat4,
    projection: Mat4,
    color: Vec4,
    globals: HashMap<String, GlobalValue>,
    viewport: Viewport,
    stats: FrameStats,
}

impl WgpuCommandBuffer {
    /// Wraps an existing device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let pipelines = FlatPipelines::new(&device);

        // Single texel readback; rows must be 256-byte aligned
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: 256,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            device,
            queue,
            textures: Vec::new(),
            pipelines,
            meshes: HashMap::new(),
            staging_buffer,
            pass: PendingPass::default(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            color: Vec4::ONE,
            globals: HashMap::new(),
            viewport: Viewport::default(),
            stats: FrameStats::default(),
        }
    }

    /// Creates a command buffer on a new device without a window.
    pub async fn request_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("thunder device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        log::info!("headless device on '{}'", adapter.get_info().name);
        Ok(Self::new(device, queue))
    }

    /// Blocking variant of [`Self::request_headless`].
    pub fn new_headless() -> RenderResult<Self> {
        pollster::block_on(Self::request_headless())
    }

    /// Returns the device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns the queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the view of a texture for sampling.
    pub fn texture_view(&self, texture: TextureHandle) -> Option<&wgpu::TextureView> {
        self.texture(texture).map(|t| &t.view)
    }

    /// Encodes a full-screen triangle into `target`.
    ///
    /// Pending draws are flushed first so the pass sees their results.
    pub fn fullscreen_pass(
        &mut self,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        target: TextureHandle,
    ) {
        self.flush();
        let Some(target) = self.texture(target) else {
            log::warn!("{label}: unknown target {}", target.index());
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn texture(&self, texture: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(texture.index() as usize)
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        let color = self.pass.color.and_then(|h| self.texture(h));
        let depth = self.pass.depth.and_then(|h| self.texture(h));
        match (color, depth) {
            (Some(c), Some(d)) => Some((c.width.min(d.width), c.height.min(d.height))),
            (Some(t), None) | (None, Some(t)) => Some((t.width, t.height)),
            (None, None) => None,
        }
    }

    /// Converts a bottom-left viewport to a clamped top-left one.
    fn device_viewport(viewport: Viewport, width: u32, height: u32) -> Option<(f32, f32, f32, f32)> {
        let x0 = viewport.x.clamp(0, width as i32);
        let y0 = viewport.y.clamp(0, height as i32);
        let x1 = (i64::from(viewport.x) + i64::from(viewport.width)).clamp(0, i64::from(width)) as i32;
        let y1 = (i64::from(viewport.y) + i64::from(viewport.height)).clamp(0, i64::from(height)) as i32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let top = height as i32 - y1;
        Some((x0 as f32, top as f32, (x1 - x0) as f32, (y1 - y0) as f32))
    }

    /// Encodes and submits the pending pass, keeping the bound target.
    fn flush(&mut self) {
        if self.pass.is_empty() {
            return;
        }
        let draws = std::mem::take(&mut self.pass.draws);
        let clear_color = self.pass.clear_color.take();
        let clear_depth = self.pass.clear_depth.take();

        let Some((width, height)) = self.target_size() else {
            log::debug!("dropping {} draws without a render target", draws.len());
            return;
        };

        for draw in &draws {
            self.pipelines.get(&self.device, draw.key);
        }

        let color_view = self.pass.color.and_then(|h| self.texture(h)).map(|t| &t.view);
        let depth_view = self.pass.depth.and_then(|h| self.texture(h)).map(|t| &t.view);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Flat Pass Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Flat Pass"),
                color_attachments: &[color_view.map(|view| wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: clear_color.map_or(wgpu::LoadOp::Load, |c| {
                            wgpu::LoadOp::Clear(wgpu::Color {
                                r: f64::from(c.x),
                                g: f64::from(c.y),
                                b: f64::from(c.z),
                                a: f64::from(c.w),
                            })
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_view.map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: clear_depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });

            for draw in &draws {
                let Some(surface) = self.meshes.get(&draw.surface) else {
                    continue;
                };
                let Some(pipeline) = self.pipelines.cached(draw.key) else {
                    continue;
                };
                let Some((x, y, w, h)) = Self::device_viewport(draw.viewport, width, height)
                else {
                    continue;
                };
                render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, surface.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(surface.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..surface.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl CommandBuffer for WgpuCommandBuffer {
    fn create_texture(
        &mut self,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Option<TextureHandle> {
        let index = u32::try_from(self.textures.len()).ok()?;
        self.textures
            .push(GpuTexture::new(&self.device, label, format, width, height));
        Some(TextureHandle::new(index))
    }

    fn resize_texture(&mut self, texture: TextureHandle, width: u32, height: u32) {
        if self.pass.color == Some(texture) || self.pass.depth == Some(texture) {
            self.flush();
        }
        if let Some(t) = self.textures.get_mut(texture.index() as usize) {
            t.resize(&self.device, width, height);
        }
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.texture(texture).map(|t| (t.width, t.height))
    }

    fn set_render_target(&mut self, color: Option<TextureHandle>, depth: Option<TextureHandle>) {
        if self.pass.color == color && self.pass.depth == depth {
            return;
        }
        self.flush();
        self.pass.color = color;
        self.pass.depth = depth;
    }

    fn clear_render_target(&mut self, clear_color: bool, color: Vec4, clear_depth: bool, depth: f32) {
        if !self.pass.draws.is_empty() {
            self.flush();
        }
        if clear_color {
            self.pass.clear_color = Some(color);
        }
        if clear_depth {
            self.pass.clear_depth = Some(depth);
        }
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }

    fn view(&self) -> Mat4 {
        self.view
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    fn color(&self) -> Vec4 {
        self.color
    }

    fn set_global_value(&mut self, name: &str, value: GlobalValue) {
        self.globals.insert(name.to_string(), value);
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
        let Some(source) = mesh.surface(surface) else {
            log::trace!("mesh '{}' has no surface {surface}", mesh.name());
            return;
        };
        if self.pass.color.is_none() && self.pass.depth.is_none() {
            log::debug!("draw of '{}' without a render target", mesh.name());
            return;
        }
        self.stats.draw_calls += 1;
        self.stats.polygons += source.primitive_count() as u64;

        let key = (mesh.id(), surface);
        let device = &self.device;
        let gpu = self
            .meshes
            .entry(key)
            .or_insert_with(|| GpuSurface::upload(device, mesh.name(), source));
        gpu.used = true;
        if gpu.index_count == 0 {
            return;
        }
        let mode = gpu.mode;

        let color_format = self
            .pass
            .color
            .and_then(|h| self.texture(h))
            .map(|t| wgpu_format(t.format));
        let translucent = layer.contains(Layer::TRANSLUCENT)
            || material.is_some_and(|m| m.material.translucent)
            || self.color.w < 1.0;
        let pipeline_key = PipelineKey {
            color_format,
            depth: self.pass.depth.is_some(),
            mode,
            blend: translucent && !layer.intersects(Layer::RAYCAST | Layer::SHADOWCAST),
        };

        let uniforms = DrawUniforms {
            mvp: (self.projection * self.view * transform).to_cols_array_2d(),
            color: self.color.to_array(),
        };
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniform Buffer"),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &self.pipelines.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.pass.draws.push(PendingDraw {
            surface: key,
            key: pipeline_key,
            bind_group,
            viewport: self.viewport,
        });
    }

    fn read_pixel(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<[u8; 4]> {
        self.flush();
        let t = self.texture(texture)?;
        if t.format.is_depth() {
            return None;
        }
        self.read_texel(texture, x, y)
    }

    fn read_depth(&mut self, texture: TextureHandle, x: u32, y: u32) -> Option<f32> {
        self.flush();
        let t = self.texture(texture)?;
        if !t.format.is_depth() {
            return None;
        }
        self.read_texel(texture, x, y).map(f32::from_le_bytes)
    }

    fn submit(&mut self) {
        self.flush();
        // Surfaces not drawn since the last submit are released
        self.meshes.retain(|_, s| std::mem::take(&mut s.used));
    }

    fn stats(&self) -> FrameStats {
        self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = FrameStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_viewport_flips_origin() {
        let vp = Viewport {
            x: 0,
            y: 0,
            width: 10,
            height: 5,
        };
        assert_eq!(
            WgpuCommandBuffer::device_viewport(vp, 10, 20),
            Some((0.0, 15.0, 10.0, 5.0))
        );
    }

    #[test]
    fn test_device_viewport_clamps() {
        let vp = Viewport {
            x: -4,
            y: 8,
            width: 100,
            height: 100,
        };
        assert_eq!(
            WgpuCommandBuffer::device_viewport(vp, 10, 10),
            Some((0.0, 0.0, 10.0, 2.0))
        );
        let outside = Viewport {
            x: 20,
            y: 0,
            width: 4,
            height: 4,
        };
        assert_eq!(WgpuCommandBuffer::device_viewport(outside, 10, 10), None);
    }
}
