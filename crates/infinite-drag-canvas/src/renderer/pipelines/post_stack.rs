use crate::post::{PostParams, UboVignette, UboWarp};
use wgpu::util::DeviceExt;

/// Intermediate texture format
const INTERMEDIATE_FMT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Full-screen triangle vertices
const FS_TRI: [[f32; 2]; 3] = [
    [-1.0, -1.0],
    [3.0, -1.0],
    [-1.0, 3.0],
];

/// WGSL shader for a simple texture blit/passthrough.
const BLIT_WGSL: &str = r#"
struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0)         uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec2<f32>) -> VSOut {
    var out: VSOut;
    out.clip = vec4<f32>(pos, 0.0, 1.0);
    out.uv = vec2<f32>(0.5 * (pos.x + 1.0), 0.5 * (-pos.y + 1.0));
    return out;
}

@group(0) @binding(0) var tSrc: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return textureSampleLevel(tSrc, samp, in.uv, 0.0);
}
"#;

/// Intermediate target between the vignette and the warp.
pub struct Intermediate {
    pub view: wgpu::TextureView,
    size: wgpu::Extent3d,
    _tex: wgpu::Texture,
}

impl Intermediate {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("PostStack Intermediate"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: INTERMEDIATE_FMT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        Self {
            view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
            _tex: tex,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.size.width == width && self.size.height == height {
            return;
        }
        *self = Self::new(device, width, height);
    }
}

// -------------------- Pass Types --------------------

struct VignettePass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
    fs_vbo: wgpu::Buffer,
}

struct LensWarpPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    ubo: wgpu::Buffer,
    fs_vbo: wgpu::Buffer,
}

struct BlitPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fs_vbo: wgpu::Buffer,
}

pub struct PostStack {
    intermediate: Intermediate,
    vignette: VignettePass,
    warp: LensWarpPass,
    blit: BlitPass,
}

impl PostStack {
    pub fn new(device: &wgpu::Device, out_fmt: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        Self {
            intermediate: Intermediate::new(device, width, height),
            vignette: VignettePass::new(device, INTERMEDIATE_FMT),
            warp: LensWarpPass::new(device, out_fmt),
            blit: BlitPass::new(device, out_fmt),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.intermediate.resize(device, width, height);
    }

    /// Scene → vignette → lens warp → swapchain. A disabled warp is replaced
    /// by a blit so the swapchain is always written.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        swapchain_dst: &wgpu::TextureView,
        scene_color_src: &wgpu::TextureView,
        params: &PostParams,
        vignette: &UboVignette,
        warp: &UboWarp,
    ) {
        let mut source = scene_color_src;

        if params.vignette_on {
            self.vignette
                .draw(device, queue, encoder, &self.intermediate.view, source, vignette);
            source = &self.intermediate.view;
        }

        if params.warp_on {
            self.warp.draw(device, queue, encoder, swapchain_dst, source, warp);
        } else {
            self.blit.draw(device, encoder, swapchain_dst, source);
        }
    }
}

// -------------------- Pass Implementations --------------------

fn bind_group_layout(device: &wgpu::Device, label: &str, ubo_size: Option<u64>) -> wgpu::BindGroupLayout {
    let mut entries = vec![
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
    ];
    if let Some(size) = ubo_size {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::BindGroupLayout,
    out_fmt: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipe_layout),
        vertex: wgpu::VertexState {
            module: shader,
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
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: out_fmt,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

fn fs_triangle(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&FS_TRI),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

macro_rules! create_post_pass {
    ($name:ident, $ubo_type:ty, $shader:expr) => {
        impl $name {
            pub fn new(device: &wgpu::Device, out_fmt: wgpu::TextureFormat) -> Self {
                let layout = bind_group_layout(
                    device,
                    concat!(stringify!($name), " Layout"),
                    Some(std::mem::size_of::<$ubo_type>() as u64),
                );
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some($shader),
                    source: wgpu::ShaderSource::Wgsl(
                        include_str!(concat!("../../../shaders/", $shader)).into(),
                    ),
                });
                let pipeline = fullscreen_pipeline(
                    device,
                    concat!(stringify!($name), " Pipeline"),
                    &shader,
                    &layout,
                    out_fmt,
                );
                let ubo = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(concat!(stringify!($name), " UBO")),
                    size: std::mem::size_of::<$ubo_type>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                Self {
                    pipeline,
                    layout,
                    sampler: linear_sampler(device, concat!(stringify!($name), " Sampler")),
                    ubo,
                    fs_vbo: fs_triangle(device, concat!(stringify!($name), " FS VBO")),
                }
            }

            pub fn draw(
                &self,
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                encoder: &mut wgpu::CommandEncoder,
                dst: &wgpu::TextureView,
                t_src: &wgpu::TextureView,
                ubo: &$ubo_type,
            ) {
                queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(ubo));
                let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(concat!(stringify!($name), " Bind")),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(t_src),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: self.ubo.as_entire_binding(),
                        },
                    ],
                });
                execute_pass(
                    &self.pipeline,
                    encoder,
                    &bind,
                    &self.fs_vbo,
                    dst,
                    concat!(stringify!($name), " Pass"),
                );
            }
        }
    };
}

create_post_pass!(VignettePass, UboVignette, "vignette.wgsl");
create_post_pass!(LensWarpPass, UboWarp, "lens_warp.wgsl");

fn execute_pass(
    pipeline: &wgpu::RenderPipeline,
    encoder: &mut wgpu::CommandEncoder,
    bind_group: &wgpu::BindGroup,
    fs_vbo: &wgpu::Buffer,
    dst: &wgpu::TextureView,
    label: &str,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: dst,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    rpass.set_vertex_buffer(0, fs_vbo.slice(..));
    rpass.draw(0..3, 0..1);
}

impl BlitPass {
    pub fn new(device: &wgpu::Device, out_fmt: wgpu::TextureFormat) -> Self {
        let layout = bind_group_layout(device, "Blit Layout", None);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_WGSL.into()),
        });
        Self {
            pipeline: fullscreen_pipeline(device, "Blit Pipeline", &shader, &layout, out_fmt),
            layout,
            sampler: linear_sampler(device, "Blit Sampler"),
            fs_vbo: fs_triangle(device, "Blit FS VBO"),
        }
    }

    pub fn draw(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        dst: &wgpu::TextureView,
        t_src: &wgpu::TextureView,
    ) {
        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(t_src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        execute_pass(&self.pipeline, encoder, &bind, &self.fs_vbo, dst, "Blit Pass");
    }
}
