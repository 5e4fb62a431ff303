//! Entry point for the infinite drag canvas.

use anyhow::Result;
use clap::Parser;
use infinite_drag_canvas::{app::App, config::Args};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Infinite Drag Canvas")
            .with_inner_size(winit::dpi::LogicalSize::new(args.width, args.height))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), &args))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                // Canvas events are handled inside; only app-level keys here.
                let consumed = app.handle_event(&window, &event);
                match event {
                    WindowEvent::CloseRequested => {
                        app.shutdown();
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. }
                        if !consumed && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
                    {
                        app.shutdown();
                        elwt.exit();
                    }
                    WindowEvent::RedrawRequested => match app.render(&window) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            app.resize(app.engine.backend().gfx.size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("WGPU out of memory – exiting.");
                            app.shutdown();
                            elwt.exit();
                        }
                        Err(e) => log::error!("Render error: {:?}", e),
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
