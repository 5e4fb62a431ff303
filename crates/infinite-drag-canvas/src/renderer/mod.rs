//! The wgpu backend. Owns the GPU context, the offscreen scene target, the
//! card pipeline and the post stack, and implements [`SceneBackend`].

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{
        cards::{CardGpu, CardPipeline},
        post_stack::PostStack,
    },
    targets::Targets,
};
use crate::{
    engine::{FrameScene, SceneBackend},
    hover::CardId,
    texture::CardTexture,
};
use std::collections::HashMap;
use std::sync::Arc;
use winit::window::Window;

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub cards: CardPipeline,
    pub post_stack: PostStack,
    pub egui_renderer: egui_wgpu::Renderer,
    card_gpu: HashMap<CardId, CardGpu>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;

        let targets = Targets::new(&gfx.device, size);
        let cards = CardPipeline::new(&gfx.device, targets.color_fmt);
        let post_stack = PostStack::new(&gfx.device, gfx.config.format, size.width, size.height);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            cards,
            post_stack,
            egui_renderer,
            card_gpu: HashMap::new(),
        })
    }
}

impl SceneBackend for Renderer {
    type Target = wgpu::TextureView;

    fn allocate_card(&mut self, id: CardId, texture: &CardTexture) {
        let gpu = self.cards.create_card(&self.gfx.device, &self.gfx.queue, texture);
        if let Some(stale) = self.card_gpu.insert(id, gpu) {
            log::warn!("Card {:?} allocated twice; dropping stale GPU resources", id);
            stale.destroy();
        }
    }

    fn replace_texture(&mut self, id: CardId, texture: &CardTexture) {
        if let Some(gpu) = self.card_gpu.get_mut(&id) {
            self.cards
                .replace_texture(&self.gfx.device, &self.gfx.queue, gpu, texture);
        }
    }

    fn update_texture(&mut self, id: CardId, texture: &CardTexture) {
        if let Some(gpu) = self.card_gpu.get_mut(&id) {
            self.cards
                .update_texture(&self.gfx.device, &self.gfx.queue, gpu, texture);
        }
    }

    fn release_card(&mut self, id: CardId) {
        if let Some(gpu) = self.card_gpu.remove(&id) {
            gpu.destroy();
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let size = winit::dpi::PhysicalSize::new(width, height);
        self.gfx.resize(size);
        self.targets.resize(&self.gfx.device, size);
        self.post_stack.resize(&self.gfx.device, width, height);
    }

    fn render(&mut self, swap_view: &wgpu::TextureView, scene: &FrameScene<'_>) {
        self.cards.write_globals(&self.gfx.queue, scene.view_proj);
        for draw in scene.cards {
            if let Some(gpu) = self.card_gpu.get(&draw.id) {
                self.cards
                    .write_card(&self.gfx.queue, gpu, draw, scene.overlay_region);
            }
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Pass 1: cards into the offscreen scene target
        {
            let [r, g, b] = scene.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Card Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in scene.cards {
                if let Some(gpu) = self.card_gpu.get(&draw.id) {
                    self.cards.draw_card(&mut pass, gpu);
                }
            }
        }

        // Pass 2..3: vignette, then lens warp onto the swapchain
        self.post_stack.run(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            swap_view,
            &self.targets.color,
            &scene.post,
            &scene.vignette,
            &scene.warp,
        );

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn detach(&mut self) {
        for (_, gpu) in self.card_gpu.drain() {
            gpu.destroy();
        }
        self.gfx.detach();
    }
}
