//! Offscreen scene target the card pass draws into before post-processing.

pub struct Targets {
    // Keep the texture alive for the lifetime of the view.
    _color_tex: wgpu::Texture,

    pub color: wgpu::TextureView,
    pub color_fmt: wgpu::TextureFormat,
}

impl Targets {
    pub fn new(device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) -> Self {
        let color_fmt = wgpu::TextureFormat::Rgba16Float;
        let color_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_fmt,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            color_fmt,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) {
        *self = Self::new(device, size);
    }
}
