//! Flat-color render pipelines, created on demand per attachment layout.

use std::collections::HashMap;

use thunder_core::PrimitiveMode;

/// Everything that selects a distinct `wgpu::RenderPipeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub color_format: Option<wgpu::TextureFormat>,
    pub depth: bool,
    pub mode: PrimitiveMode,
    pub blend: bool,
}

/// GPU representation of per-draw uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub mvp: [[f32; 4]; 4],
    pub color: [f32; 4],
}

pub(crate) struct FlatPipelines {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pub bind_group_layout: wgpu::BindGroupLayout,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

fn topology(mode: PrimitiveMode) -> (wgpu::PrimitiveTopology, Option<wgpu::IndexFormat>) {
    match mode {
        PrimitiveMode::Lines => (wgpu::PrimitiveTopology::LineList, None),
        PrimitiveMode::LineStrip => (
            wgpu::PrimitiveTopology::LineStrip,
            Some(wgpu::IndexFormat::Uint32),
        ),
        PrimitiveMode::Triangles => (wgpu::PrimitiveTopology::TriangleList, None),
    }
}

impl FlatPipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flat Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/flat.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flat Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Self {
            shader,
            layout,
            bind_group_layout,
            cache: HashMap::new(),
        }
    }

    /// Returns the pipeline for `key`, building it on first use.
    pub fn get(&mut self, device: &wgpu::Device, key: PipelineKey) -> &wgpu::RenderPipeline {
        let Self {
            shader,
            layout,
            cache,
            ..
        } = self;
        cache
            .entry(key)
            .or_insert_with(|| Self::build(device, shader, layout, key))
    }

    /// Returns an already built pipeline.
    pub fn cached(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.cache.get(&key)
    }

    fn build(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        key: PipelineKey,
    ) -> wgpu::RenderPipeline {
        log::trace!("building flat pipeline {key:?}");
        let (topology, strip_index_format) = topology(key.mode);
        let blend = key.blend.then_some(wgpu::BlendState::ALPHA_BLENDING);
        let targets = [key.color_format.map(|format| wgpu::ColorTargetState {
            format,
            blend,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Flat Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: key.color_format.map(|_| wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format,
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: key.depth.then(|| wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: !key.blend,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
