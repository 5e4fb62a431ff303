use crate::{
    hover::CardId,
    motion::{MotionConfig, MotionPhase},
    post::{PostParams, WarpBoundary},
};
use glam::Vec2;

pub struct HudStats {
    pub cards: usize,
    pub root: Vec2,
    pub velocity: Vec2,
    pub phase: MotionPhase,
    pub hovered: Option<CardId>,
    /// URLs known to the thumbnail cache.
    pub thumbnails: usize,
    /// Textures still waiting for their thumbnail.
    pub loading: usize,
}

pub fn draw_hud(ctx: &egui::Context, stats: &HudStats) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("cards: {}", stats.cards));
            ui.label(format!("root: ({:.1}, {:.1})", stats.root.x, stats.root.y));
            ui.label(format!(
                "velocity: ({:.2}, {:.2}) {:?}",
                stats.velocity.x, stats.velocity.y, stats.phase
            ));
            match stats.hovered {
                Some(id) => ui.label(format!("hover: tile {} slot {}", id.tile, id.slot)),
                None => ui.label("hover: -"),
            };
            if stats.thumbnails > 0 {
                ui.label(format!("thumbnails: {} ({} waiting)", stats.thumbnails, stats.loading));
            }
        });
}

/// Live tuning for the feel parameters and the post chain.
pub fn draw_tuning_panel(ctx: &egui::Context, motion: &mut MotionConfig, post: &mut PostParams) {
    egui::Window::new("Tuning")
        .default_open(false)
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .show(ctx, |ui| {
            ui.heading("Drag");
            ui.add(egui::Slider::new(&mut motion.drag_multiplier, 0.05..=2.0).text("drag multiplier"));
            ui.add(egui::Slider::new(&mut motion.smoothing, 0.05..=1.0).text("smoothing"));
            ui.add(
                egui::Slider::new(&mut motion.fast_drag_smoothing, 0.05..=1.0)
                    .text("fast-drag smoothing"),
            );
            ui.add(
                egui::Slider::new(&mut motion.fast_drag_threshold, 1.0..=100.0)
                    .text("fast-drag threshold"),
            );

            ui.separator();
            ui.heading("Momentum");
            let bands = &mut motion.momentum;
            for (name, band) in [
                ("idle", &mut bands.idle),
                ("slow", &mut bands.slow),
                ("medium", &mut bands.medium),
                ("fast", &mut bands.fast),
            ] {
                ui.horizontal(|ui| {
                    ui.label(name);
                    ui.add(
                        egui::DragValue::new(&mut band.damping)
                            .speed(0.001)
                            .clamp_range(0.5..=0.999)
                            .prefix("damp "),
                    );
                    ui.add(
                        egui::DragValue::new(&mut band.distance_multiplier)
                            .speed(0.01)
                            .clamp_range(0.0..=8.0)
                            .prefix("dist x"),
                    );
                });
            }

            ui.separator();
            ui.heading("Post");
            ui.checkbox(&mut post.vignette_on, "Vignette");
            ui.add(egui::Slider::new(&mut post.vignette_start, 0.0..=1.5).text("start"));
            ui.add(egui::Slider::new(&mut post.vignette_falloff, 0.01..=1.5).text("falloff"));
            ui.add(egui::Slider::new(&mut post.vignette_strength, 0.0..=4.0).text("strength"));

            ui.checkbox(&mut post.warp_on, "Lens warp");
            ui.add(egui::Slider::new(&mut post.warp_strength, -0.5..=0.5).text("k"));
            egui::ComboBox::from_label("boundary")
                .selected_text(match post.warp_boundary {
                    WarpBoundary::Wrap => "wrap",
                    WarpBoundary::Fallback => "fallback",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut post.warp_boundary, WarpBoundary::Wrap, "wrap");
                    ui.selectable_value(&mut post.warp_boundary, WarpBoundary::Fallback, "fallback");
                });
        });
}
