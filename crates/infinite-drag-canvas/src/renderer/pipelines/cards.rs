use crate::engine::CardDraw;
use crate::texture::CardTexture;
use glam::Mat4;
use wgpu::util::DeviceExt;

const CARD_TEX_FMT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboGlobals {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboCard {
    center: [f32; 2],
    size: f32,
    overlay_opacity: f32,
    overlay_rect: [f32; 4],
}

const _: [(); 64] = [(); core::mem::size_of::<UboGlobals>()];
const _: [(); 32] = [(); core::mem::size_of::<UboCard>()];

/// GPU resources of one card.
pub struct CardGpu {
    texture: wgpu::Texture,
    ubo: wgpu::Buffer,
    bind: wgpu::BindGroup,
    size: (u32, u32),
}

impl CardGpu {
    pub fn destroy(&self) {
        self.texture.destroy();
        self.ubo.destroy();
    }
}

pub struct CardPipeline {
    pipeline: wgpu::RenderPipeline,
    card_layout: wgpu::BindGroupLayout,
    globals_ubo: wgpu::Buffer,
    globals_bind: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    quad_vb: wgpu::Buffer,
}

impl CardPipeline {
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Self {
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Card Globals Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<UboGlobals>() as u64),
                },
                count: None,
            }],
        });

        let card_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Card Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<UboCard>() as u64),
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/card.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/card.wgsl").into()),
        });

        // Unit quad centered on the origin, two triangles.
        let quad_corners: [[f32; 2]; 6] = [
            [-0.5, -0.5],
            [0.5, -0.5],
            [0.5, 0.5],
            [-0.5, -0.5],
            [0.5, 0.5],
            [-0.5, 0.5],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Card Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Card PipelineLayout"),
            bind_group_layouts: &[&globals_layout, &card_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Card Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        shader_location: 0,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let globals_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Card Globals UBO"),
            size: std::mem::size_of::<UboGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Card Globals Bind"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Card Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            card_layout,
            globals_ubo,
            globals_bind,
            sampler,
            quad_vb,
        }
    }

    fn create_texture(device: &wgpu::Device, queue: &wgpu::Queue, tex: &CardTexture) -> wgpu::Texture {
        let (width, height) = tex.size();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Card Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CARD_TEX_FMT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self::write_pixels(queue, &texture, tex);
        texture
    }

    fn write_pixels(queue: &wgpu::Queue, texture: &wgpu::Texture, tex: &CardTexture) {
        let (width, height) = tex.size();
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            tex.image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn bind(&self, device: &wgpu::Device, texture: &wgpu::Texture, ubo: &wgpu::Buffer) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Card Bind"),
            layout: &self.card_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ubo.as_entire_binding(),
                },
            ],
        })
    }

    pub fn create_card(&self, device: &wgpu::Device, queue: &wgpu::Queue, tex: &CardTexture) -> CardGpu {
        let texture = Self::create_texture(device, queue, tex);
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Card UBO"),
            size: std::mem::size_of::<UboCard>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind = self.bind(device, &texture, &ubo);
        CardGpu {
            texture,
            ubo,
            bind,
            size: tex.size(),
        }
    }

    /// Swaps the card's texture for `tex`, destroying the old one.
    pub fn replace_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue, card: &mut CardGpu, tex: &CardTexture) {
        let texture = Self::create_texture(device, queue, tex);
        card.bind = self.bind(device, &texture, &card.ubo);
        let old = std::mem::replace(&mut card.texture, texture);
        old.destroy();
        card.size = tex.size();
    }

    /// Re-uploads pixels changed in place.
    pub fn update_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue, card: &mut CardGpu, tex: &CardTexture) {
        if card.size == tex.size() {
            Self::write_pixels(queue, &card.texture, tex);
        } else {
            self.replace_texture(device, queue, card, tex);
        }
    }

    pub fn write_globals(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        queue.write_buffer(
            &self.globals_ubo,
            0,
            bytemuck::bytes_of(&UboGlobals {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );
    }

    pub fn write_card(&self, queue: &wgpu::Queue, card: &CardGpu, draw: &CardDraw, overlay_rect: [f32; 4]) {
        queue.write_buffer(
            &card.ubo,
            0,
            bytemuck::bytes_of(&UboCard {
                center: draw.center.to_array(),
                size: draw.size,
                overlay_opacity: draw.overlay_opacity,
                overlay_rect,
            }),
        );
    }

    pub fn draw_card<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, card: &'a CardGpu) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.globals_bind, &[]);
        rpass.set_bind_group(1, &card.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.draw(0..6, 0..1);
    }
}
