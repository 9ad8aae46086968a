//! Render target allocation.

use thunder_core::TextureFormat;

/// A device texture behind a [`thunder_core::TextureHandle`].
pub(crate) struct GpuTexture {
    pub label: String,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Maps a core texture format to the device format.
pub(crate) fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        // Unorm, not sRGB, so pick ids read back exactly
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Depth32 => wgpu::TextureFormat::Depth32Float,
    }
}

impl GpuTexture {
    /// Allocates a render target that can also be sampled and copied out.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(format),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            label: label.to_string(),
            format,
            width: width.max(1),
            height: height.max(1),
            texture,
            view,
        }
    }

    /// Reallocates at a new size. No-op when the size is unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width == width.max(1) && self.height == height.max(1) {
            return;
        }
        *self = Self::new(device, &self.label, self.format, width, height);
    }

    /// Texture aspect copied during readback.
    pub fn copy_aspect(&self) -> wgpu::TextureAspect {
        if self.format.is_depth() {
            wgpu::TextureAspect::DepthOnly
        } else {
            wgpu::TextureAspect::All
        }
    }
}
