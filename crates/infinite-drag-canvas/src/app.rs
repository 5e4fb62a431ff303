use crate::{
    cards::{demo_catalog, load_catalog},
    config::{Args, CanvasConfig},
    engine::CanvasEngine,
    host::{CanvasEvent, WindowHost},
    renderer::Renderer,
    texture::{loader::HttpThumbnailSource, CardTextureFactory},
    ui::{self, HudStats},
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Instant};
use winit::{
    event::WindowEvent,
    window::{CursorIcon, Window},
};

const MOUNT_ID: &str = "canvas";
const MAX_FRAME_DT: f32 = 0.1;

pub struct App {
    pub engine: CanvasEngine<Renderer>,
    pub host: WindowHost,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    show_hud: bool,
    last_frame: Instant,
    /// Cursor last set by the canvas; `None` while egui owns it.
    cursor: Option<CursorIcon>,
}

/// Open hand over the canvas, closed while dragging.
fn canvas_cursor(dragging: bool) -> CursorIcon {
    if dragging {
        CursorIcon::Grabbing
    } else {
        CursorIcon::Grab
    }
}

impl App {
    pub async fn new(window: Arc<Window>, args: &Args) -> Result<Self> {
        let config = CanvasConfig::resolve(args).context("loading configuration")?;

        let records = match &args.cards {
            Some(path) => load_catalog(path)
                .with_context(|| format!("loading card catalog {}", path.display()))?,
            None => {
                log::info!("No card catalog given; using the built-in demo set");
                demo_catalog()
            }
        };

        let renderer = Renderer::new(window.clone()).await?;
        let mut host = WindowHost::new(MOUNT_ID, window.inner_size());
        let factory = CardTextureFactory::new(&config.texture, Box::new(HttpThumbnailSource::spawn()));
        let engine = CanvasEngine::new(MOUNT_ID, &mut host, renderer, records, config, factory)?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            engine,
            host,
            egui_ctx,
            egui_state,
            show_hud: !args.no_hud,
            last_frame: Instant::now(),
            cursor: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.engine.resize(new_size.width, new_size.height);
    }

    /// Feeds egui first, then the canvas. Release, leave and resize always
    /// reach the canvas so a drag cannot outlive the button.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let consumed = self.egui_state.on_window_event(window, event).consumed;

        if let Some(canvas_event) = self.host.translate(event) {
            let always = matches!(
                canvas_event,
                CanvasEvent::PointerUp | CanvasEvent::PointerLeave | CanvasEvent::Resize { .. }
            );
            if always || !consumed {
                for listener in self.host.dispatch(&canvas_event) {
                    self.engine.on_event(listener, &canvas_event);
                }
            }
        }

        let wanted = (!self.egui_ctx.is_pointer_over_area())
            .then(|| canvas_cursor(self.engine.motion().is_dragging()));
        if wanted != self.cursor {
            if let Some(icon) = wanted {
                window.set_cursor_icon(icon);
            }
            self.cursor = wanted;
        }

        consumed
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;
        self.engine.tick(dt);

        let (width, height) = self.engine.viewport();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let Some(frame) = self.engine.backend().gfx.acquire() else {
            return Ok(());
        };
        let frame = frame?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.engine.render(&swap_view);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        if self.show_hud {
            let stats = HudStats {
                cards: self.engine.card_count(),
                root: self.engine.root_position(),
                velocity: self.engine.motion().velocity(),
                phase: self.engine.motion().phase(),
                hovered: self.engine.hovered(),
                thumbnails: self.engine.textures().cache().len(),
                loading: self.engine.textures().pending_textures(),
            };
            ui::draw_hud(&self.egui_ctx, &stats);

            let (motion, post) = self.engine.tuning_mut();
            ui::draw_tuning_panel(&self.egui_ctx, motion, post);
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let renderer = self.engine.backend_mut();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [renderer.gfx.config.width, renderer.gfx.config.height],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            renderer
                .egui_renderer
                .update_texture(&renderer.gfx.device, &renderer.gfx.queue, *id, delta);
        }

        renderer.egui_renderer.update_buffers(
            &renderer.gfx.device,
            &renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            renderer.egui_renderer.free_texture(id);
        }

        renderer.gfx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }

    /// Tears the canvas down. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.engine.dispose(&mut self.host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_closes_while_dragging() {
        assert_eq!(canvas_cursor(false), CursorIcon::Grab);
        assert_eq!(canvas_cursor(true), CursorIcon::Grabbing);
    }
}
