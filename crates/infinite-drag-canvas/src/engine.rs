//! The canvas engine: owns the tile-grid root, the motion controller, the
//! camera and every card, and drives them through an ordered per-frame tick.
//!
//! GPU work is delegated to a [`SceneBackend`]; the engine itself never
//! touches wgpu, so it runs unchanged against the recording backend in tests.

use crate::{
    camera::{pointer_to_ndc, Camera},
    cards::{record_for, CardRecord},
    config::CanvasConfig,
    grid::{GridConfig, GridLayout},
    host::{CanvasEvent, EventKind, ListenerId, MountHost},
    hover::{self, CardId, CardQuad, HoverPicker, HoverTransition},
    motion::{DragMomentumController, MotionConfig, MotionEvent},
    post::{PostParams, PostState, UboVignette, UboWarp},
    texture::{thumbnail_region, CardTexture, CardTextureFactory, RenderJob, SharedTexture},
    wrap::InfiniteTileWrapper,
};
use glam::{Mat4, Vec2};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("mount '{0}' not found")]
    MountNotFound(String),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("invalid motion settings: {0}")]
    InvalidMotion(String),
}

/// One card as the backend should draw it this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardDraw {
    pub id: CardId,
    /// World-space center on the `z = 0` plane.
    pub center: Vec2,
    pub size: f32,
    pub overlay_opacity: f32,
}

pub struct FrameScene<'a> {
    pub view_proj: Mat4,
    pub clear_color: [f32; 3],
    pub cards: &'a [CardDraw],
    /// Card-local UV rect `[x, y, w, h]` covered by the hover overlay.
    pub overlay_region: [f32; 4],
    pub post: PostParams,
    pub vignette: UboVignette,
    pub warp: UboWarp,
}

/// GPU side of the engine. Cards are keyed by [`CardId`]; an id is released
/// before it is ever allocated again.
pub trait SceneBackend {
    type Target: ?Sized;

    fn allocate_card(&mut self, id: CardId, texture: &CardTexture);
    /// Swaps in a new texture, dropping the old GPU texture.
    fn replace_texture(&mut self, id: CardId, texture: &CardTexture);
    /// Re-uploads a texture whose pixels changed in place.
    fn update_texture(&mut self, id: CardId, texture: &CardTexture);
    fn release_card(&mut self, id: CardId);
    fn resize(&mut self, width: u32, height: u32);
    fn render(&mut self, target: &Self::Target, scene: &FrameScene<'_>);
    /// Stops presenting to the host surface.
    fn detach(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overlay {
    pub opacity: f32,
    pub target: f32,
}

impl Overlay {
    fn step(&mut self, lerp: f32) {
        self.opacity += (self.target - self.opacity) * lerp;
        if (self.target - self.opacity).abs() < 1e-3 {
            self.opacity = self.target;
        }
    }
}

pub struct CardInstance {
    pub id: CardId,
    /// Slot index; the backing record is `records[card_index % len]`.
    pub card_index: usize,
    pub local_position: Vec2,
    pub texture: SharedTexture,
    pub overlay: Overlay,
}

pub struct TileGroup {
    pub offset: Vec2,
    pub cards: Vec<CardInstance>,
}

#[derive(Default)]
pub struct TileGridRoot {
    pub position: Vec2,
    pub tiles: Vec<TileGroup>,
}

impl TileGridRoot {
    fn card_mut(&mut self, id: CardId) -> Option<&mut CardInstance> {
        self.tiles.get_mut(id.tile)?.cards.iter_mut().find(|c| c.id == id)
    }

    fn cards(&self) -> impl Iterator<Item = (&TileGroup, &CardInstance)> + '_ {
        self.tiles.iter().flat_map(|t| t.cards.iter().map(move |c| (t, c)))
    }
}

#[derive(Debug, Clone, Copy)]
struct Listeners {
    down: ListenerId,
    drag_move: ListenerId,
    up: ListenerId,
    leave: ListenerId,
    hover_move: ListenerId,
    resize: ListenerId,
}

impl Listeners {
    fn register(host: &mut impl MountHost) -> Self {
        Self {
            down: host.add_listener(EventKind::PointerDown),
            drag_move: host.add_listener(EventKind::PointerMove),
            up: host.add_listener(EventKind::PointerUp),
            leave: host.add_listener(EventKind::PointerLeave),
            hover_move: host.add_listener(EventKind::PointerMove),
            resize: host.add_listener(EventKind::Resize),
        }
    }

    fn all(&self) -> [ListenerId; 6] {
        [self.down, self.drag_move, self.up, self.leave, self.hover_move, self.resize]
    }
}

pub struct CanvasEngine<B: SceneBackend> {
    backend: B,
    config: CanvasConfig,
    records: Vec<CardRecord>,
    layout: GridLayout,
    wrapper: InfiniteTileWrapper,
    motion: DragMomentumController,
    camera: Camera,
    post_state: PostState,
    factory: CardTextureFactory,
    hover: HoverPicker,
    root: TileGridRoot,
    listeners: Option<Listeners>,
    viewport: (u32, u32),
    disposed: bool,
}

impl<B: SceneBackend> CanvasEngine<B> {
    /// Mounts a canvas on `mount_id`. Fails without registering anything if
    /// the mount does not resolve or the configuration is unusable.
    pub fn new(
        mount_id: &str,
        host: &mut impl MountHost,
        backend: B,
        records: Vec<CardRecord>,
        config: CanvasConfig,
        factory: CardTextureFactory,
    ) -> Result<Self, EngineError> {
        let (width, height) = host
            .mount_size(mount_id)
            .ok_or_else(|| EngineError::MountNotFound(mount_id.to_string()))?;
        config.grid.validate().map_err(EngineError::InvalidGrid)?;
        config.motion.validate().map_err(EngineError::InvalidMotion)?;

        let layout = GridLayout::new(config.grid);
        let mut engine = Self {
            backend,
            records,
            wrapper: InfiniteTileWrapper::new(config.grid.tile_size()),
            layout,
            motion: DragMomentumController::new(config.motion),
            camera: Camera::new(config.camera, 1.0),
            post_state: PostState::new(width, height),
            factory,
            hover: HoverPicker::new(),
            root: TileGridRoot::default(),
            listeners: None,
            viewport: (0, 0),
            disposed: false,
            config,
        };

        engine.resize(width, height);
        engine.listeners = Some(Listeners::register(host));
        engine.build_grid();
        log::info!(
            "Canvas mounted on '{}' ({}x{}), {} cards from {} records",
            mount_id,
            width,
            height,
            engine.card_count(),
            engine.records.len()
        );
        Ok(engine)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn motion(&self) -> &DragMomentumController {
        &self.motion
    }

    /// Live-tunable feel and post settings.
    pub fn tuning_mut(&mut self) -> (&mut MotionConfig, &mut PostParams) {
        (&mut self.motion.config, &mut self.config.post)
    }

    pub fn textures(&self) -> &CardTextureFactory {
        &self.factory
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn root_position(&self) -> Vec2 {
        self.root.position
    }

    pub fn hovered(&self) -> Option<CardId> {
        self.hover.hovered()
    }

    pub fn card_count(&self) -> usize {
        self.root.tiles.iter().map(|t| t.cards.len()).sum()
    }

    pub fn card(&self, id: CardId) -> Option<&CardInstance> {
        self.root.tiles.get(id.tile)?.cards.iter().find(|c| c.id == id)
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Uniforms both aspect-aware post passes will receive.
    pub fn post_uniforms(&self) -> (UboVignette, UboWarp) {
        (
            self.post_state.vignette_uniform(&self.config.post),
            self.post_state.warp_uniform(&self.config.post),
        )
    }

    fn build_grid(&mut self) {
        let slots: Vec<(usize, Vec2)> = self.layout.slots().collect();
        let offsets = self.layout.tile_offsets();

        let mut jobs = Vec::with_capacity(slots.len() * offsets.len());
        let mut placements = Vec::with_capacity(jobs.capacity());
        for tile in 0..offsets.len() {
            for &(slot, position) in &slots {
                let Some(record) = record_for(&self.records, slot) else {
                    log::warn!("No card record for index {}; skipping", slot);
                    continue;
                };
                jobs.push(RenderJob {
                    record,
                    index: slot,
                    highlight: None,
                });
                placements.push((CardId { tile, slot }, position));
            }
        }

        let textures = self.factory.render_batch(&jobs);

        self.root.tiles = offsets
            .iter()
            .map(|&offset| TileGroup {
                offset,
                cards: Vec::with_capacity(slots.len()),
            })
            .collect();
        for ((id, local_position), texture) in placements.into_iter().zip(textures) {
            self.backend.allocate_card(id, &texture.borrow());
            self.root.tiles[id.tile].cards.push(CardInstance {
                id,
                card_index: id.slot,
                local_position,
                texture,
                overlay: Overlay::default(),
            });
        }
        log::debug!("Allocated {} cards", self.card_count());
    }

    fn release_all(&mut self) {
        let mut released = 0;
        for tile in self.root.tiles.drain(..) {
            for card in tile.cards {
                self.backend.release_card(card.id);
                released += 1;
            }
        }
        log::debug!("Released {} cards", released);
    }

    /// Replaces the whole grid. Every old card is released before any new one
    /// is allocated.
    pub fn rebuild_grid(&mut self, grid: GridConfig) -> Result<(), EngineError> {
        grid.validate().map_err(EngineError::InvalidGrid)?;
        if self.disposed {
            return Ok(());
        }
        self.hover = HoverPicker::new();
        self.release_all();

        self.config.grid = grid;
        self.layout = GridLayout::new(grid);
        self.wrapper = InfiniteTileWrapper::new(grid.tile_size());
        self.wrapper.wrap(&mut self.root.position, None);
        self.build_grid();
        Ok(())
    }

    /// Routes an event delivered to one of this engine's listeners.
    pub fn on_event(&mut self, listener: ListenerId, event: &CanvasEvent) {
        let Some(l) = self.listeners else {
            return;
        };

        if listener == l.down {
            if let Some(p) = event.pointer() {
                let t = self.hover.clear();
                self.apply_hover(t);
                let ev = self.motion.pointer_down(p);
                self.apply_motion_event(ev);
            }
        } else if listener == l.drag_move {
            if let (true, Some(p)) = (self.motion.is_dragging(), event.pointer()) {
                self.motion.pointer_move(p);
                let t = self.hover.clear();
                self.apply_hover(t);
            }
        } else if listener == l.up || listener == l.leave {
            if let Some(ev) = self.motion.pointer_up() {
                self.apply_motion_event(ev);
            }
            if listener == l.leave {
                let t = self.hover.clear();
                self.apply_hover(t);
            }
        } else if listener == l.hover_move {
            if let (false, Some(p)) = (self.motion.is_dragging(), event.pointer()) {
                self.update_hover(p);
            }
        } else if listener == l.resize {
            if let CanvasEvent::Resize { width, height } = *event {
                self.resize(width, height);
            }
        }
    }

    fn apply_motion_event(&mut self, ev: MotionEvent) {
        match ev {
            MotionEvent::ZoomOut => self.camera.zoom_out(),
            MotionEvent::ZoomIn => self.camera.zoom_in(),
        }
    }

    fn update_hover(&mut self, pointer: Vec2) {
        let Some(ndc) = pointer_to_ndc(pointer, self.viewport.0, self.viewport.1) else {
            return;
        };
        let ray = self.camera.ray_from_ndc(ndc);
        let size = self.layout.config().image_size;
        let root = self.root.position;
        let hit = hover::pick(
            &ray,
            self.root.cards().map(|(tile, card)| CardQuad {
                id: card.id,
                center: root + tile.offset + card.local_position,
                size,
            }),
        );
        let t = self.hover.update(hit);
        self.apply_hover(t);
    }

    fn apply_hover(&mut self, t: HoverTransition) {
        if t.is_empty() {
            return;
        }
        if let Some(id) = t.left {
            self.restyle(id, false);
        }
        if let Some(id) = t.entered {
            self.restyle(id, true);
        }
    }

    /// Regenerates a card's texture in its default or highlighted look.
    fn restyle(&mut self, id: CardId, highlighted: bool) {
        let highlight = highlighted.then(|| self.factory.highlight_color());
        let overlay_target = if highlighted {
            self.config.texture.hover_overlay_opacity
        } else {
            0.0
        };
        let Some(card) = self.root.card_mut(id) else {
            return;
        };
        let Some(record) = record_for(&self.records, card.card_index) else {
            return;
        };
        let texture = self.factory.render(record, card.card_index, highlight);
        self.backend.replace_texture(id, &texture.borrow());
        card.texture = texture;
        card.overlay.target = overlay_target;
    }

    /// Runs one frame of simulation. Does not render.
    pub fn tick(&mut self, dt: f32) {
        if self.disposed {
            return;
        }

        self.motion.apply_momentum();
        let delta = self.motion.smooth();
        InfiniteTileWrapper::apply_delta(&mut self.root.position, delta);
        self.wrap_root();
        self.motion.commit_frame();

        if let Some(true) = self.camera.advance(dt) {
            self.wrap_root();
        }

        let lerp = self.config.texture.overlay_lerp;
        for tile in &mut self.root.tiles {
            for card in &mut tile.cards {
                card.overlay.step(lerp);
            }
        }

        if self.factory.poll() > 0 {
            for tile in &self.root.tiles {
                for card in &tile.cards {
                    let mut texture = card.texture.borrow_mut();
                    if texture.dirty {
                        self.backend.update_texture(card.id, &texture);
                        texture.dirty = false;
                    }
                }
            }
        }
    }

    fn wrap_root(&mut self) {
        let offsets = if self.motion.is_dragging() {
            Some(self.motion.offsets_mut())
        } else {
            None
        };
        self.wrapper.wrap(&mut self.root.position, offsets);
    }

    /// Hands the frame to the backend. A zero-sized viewport renders nothing.
    pub fn render(&mut self, target: &B::Target) {
        if self.disposed || self.viewport.0 == 0 || self.viewport.1 == 0 {
            return;
        }
        let size = self.layout.config().image_size;
        let root = self.root.position;
        let cards: Vec<CardDraw> = self
            .root
            .cards()
            .map(|(tile, card)| CardDraw {
                id: card.id,
                center: root + tile.offset + card.local_position,
                size,
                overlay_opacity: card.overlay.opacity,
            })
            .collect();
        let (vignette, warp) = self.post_uniforms();
        let scene = FrameScene {
            view_proj: self.camera.view_proj(),
            clear_color: self.config.camera.background,
            cards: &cards,
            overlay_region: thumbnail_region(),
            post: self.config.post,
            vignette,
            warp,
        };
        self.backend.render(target, &scene);
    }

    /// Updates camera, post aspect and backend together. Zero sizes only
    /// suspend rendering.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_viewport(width, height);
        self.post_state.set_viewport(width, height);
        self.backend.resize(width, height);
    }

    /// Releases listeners, cards and the backend output. Safe to call again.
    pub fn dispose(&mut self, host: &mut impl MountHost) {
        if self.disposed {
            return;
        }
        if let Some(listeners) = self.listeners.take() {
            for id in listeners.all() {
                host.remove_listener(id);
            }
        }
        self.release_all();
        self.backend.detach();
        self.factory.clear();
        self.hover = HoverPicker::new();
        self.records.clear();
        self.disposed = true;
        log::info!("Canvas disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualThumbnails, RecordingBackend, RecordingHost};
    use crate::texture::{CardTextureFactory, TextureSettings};
    use crate::cards::demo_catalog;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    type Engine = CanvasEngine<RecordingBackend>;

    fn config(rows: u32, cols: u32) -> CanvasConfig {
        let mut c = CanvasConfig::default();
        c.grid.rows = rows;
        c.grid.cols = cols;
        c.grid.image_size = 200.0;
        c.texture = TextureSettings {
            pixel_ratio: 0.1,
            ..TextureSettings::default()
        };
        c
    }

    fn factory(config: &CanvasConfig, thumbs: &ManualThumbnails) -> CardTextureFactory {
        CardTextureFactory::with_font(&config.texture, Box::new(thumbs.clone()), None)
    }

    fn mount(config: CanvasConfig) -> (Engine, RecordingHost, RecordingBackend, ManualThumbnails) {
        let mut host = RecordingHost::new("canvas", 800, 600);
        let backend = RecordingBackend::default();
        let thumbs = ManualThumbnails::default();
        let f = factory(&config, &thumbs);
        let engine = Engine::new("canvas", &mut host, backend.clone(), demo_catalog(), config, f)
            .expect("mount");
        (engine, host, backend, thumbs)
    }

    fn send(engine: &mut Engine, host: &RecordingHost, event: CanvasEvent) {
        for id in host.dispatch(&event) {
            engine.on_event(id, &event);
        }
    }

    #[test]
    fn missing_mount_fails_before_allocating() {
        let mut host = RecordingHost::new("canvas", 800, 600);
        let backend = RecordingBackend::default();
        let c = config(4, 7);
        let f = factory(&c, &ManualThumbnails::default());
        let err = Engine::new("nope", &mut host, backend.clone(), demo_catalog(), c, f)
            .err()
            .expect("should fail");

        assert_eq!(err, EngineError::MountNotFound("nope".into()));
        assert_eq!(host.added(), 0);
        assert_eq!(backend.log().allocations, 0);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let mut host = RecordingHost::new("canvas", 800, 600);
        let c = config(0, 7);
        let f = factory(&c, &ManualThumbnails::default());
        let err = Engine::new("canvas", &mut host, RecordingBackend::default(), demo_catalog(), c, f);
        assert!(matches!(err, Err(EngineError::InvalidGrid(_))));
        assert_eq!(host.added(), 0);
    }

    #[test]
    fn builds_nine_tiles_of_cards() {
        let (engine, host, backend, _) = mount(config(4, 7));
        assert_eq!(engine.card_count(), 9 * 28);
        assert_eq!(backend.log().live.len(), 9 * 28);
        assert_eq!(host.live(), 6);
    }

    #[test]
    fn missing_records_omit_cards() {
        let mut host = RecordingHost::new("canvas", 800, 600);
        let c = config(2, 2);
        let f = factory(&c, &ManualThumbnails::default());
        let engine = Engine::new("canvas", &mut host, RecordingBackend::default(), Vec::new(), c, f)
            .expect("mount");
        assert_eq!(engine.card_count(), 0);
    }

    #[test]
    fn rebuild_releases_before_allocating() {
        let (mut engine, _host, backend, _) = mount(config(4, 7));
        engine.rebuild_grid(config(4, 7).grid).unwrap();
        engine.rebuild_grid(config(2, 3).grid).unwrap();

        let log = backend.log();
        assert_eq!(log.allocations, 2 * 9 * 28 + 9 * 6);
        assert_eq!(log.releases, 2 * 9 * 28);
        assert_eq!(log.live.len(), 9 * 6);
        assert_eq!(engine.card_count(), 9 * 6);
    }

    #[test]
    fn dispose_twice_leaves_nothing_registered() {
        let (mut engine, mut host, backend, thumbs) = mount(config(4, 7));
        assert!(engine.textures().pending_textures() > 0);
        assert!(!engine.textures().cache().is_empty());
        engine.dispose(&mut host);
        engine.dispose(&mut host);

        assert_eq!(host.added(), 6);
        assert_eq!(host.removed(), 6);
        assert_eq!(host.live(), 0);
        let log = backend.log();
        assert!(log.live.is_empty());
        assert_eq!(log.detached, 1);
        assert_eq!(engine.card_count(), 0);
        assert!(engine.is_disposed());
        assert_eq!(engine.textures().pending_textures(), 0);
        assert!(engine.textures().cache().is_empty());
        assert_eq!(thumbs.attached(), 0);
    }

    #[test]
    fn resize_sets_both_aspect_uniforms() {
        let (mut engine, host, backend, _) = mount(config(4, 7));
        send(&mut engine, &host, CanvasEvent::Resize { width: 1000, height: 400 });

        let (v, w) = engine.post_uniforms();
        assert_eq!(v.aspect_ratio, 1000.0 / 400.0);
        assert_eq!(w.aspect_ratio, 1000.0 / 400.0);
        assert_eq!(engine.camera().aspect, 2.5);
        assert_eq!(backend.log().resizes.last(), Some(&(1000, 400)));

        engine.render(&());
        let frame = backend.log().frames.last().cloned().unwrap();
        assert_eq!(frame.vignette_aspect, 2.5);
        assert_eq!(frame.warp_aspect, 2.5);
        assert_eq!(frame.cards, 9 * 28);
    }

    #[test]
    fn zero_size_keeps_aspect_and_skips_render() {
        let (mut engine, _host, backend, _) = mount(config(4, 7));
        engine.resize(0, 600);
        engine.render(&());
        assert!(backend.log().frames.is_empty());
        assert_eq!(engine.post_uniforms().0.aspect_ratio, 800.0 / 600.0);

        engine.resize(800, 600);
        engine.render(&());
        assert_eq!(backend.log().frames.len(), 1);
    }

    #[test]
    fn long_drag_wraps_root_by_a_full_tile() {
        let mut c = config(4, 7);
        c.motion.drag_multiplier = 0.5;
        let (mut engine, host, _, _) = mount(c);

        send(&mut engine, &host, CanvasEvent::PointerDown { x: 0.0, y: 300.0 });
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 50.0, y: 300.0 });
        assert_eq!(engine.motion().offsets().target.x, 25.0);

        let mut wrapped = false;
        let mut x = 50.0;
        for _ in 0..200 {
            x += 50.0;
            send(&mut engine, &host, CanvasEvent::PointerMove { x, y: 300.0 });
            let before = engine.root_position().x;
            engine.tick(1.0 / 60.0);
            let after = engine.root_position().x;
            assert!(after > -700.0 && after <= 700.0, "root escaped: {after}");
            if after < before - 1000.0 {
                wrapped = true;
            }
        }
        assert!(wrapped, "root never wrapped");

        // Offsets moved with the root, so the grid keeps tracking the pointer.
        let o = engine.motion().offsets();
        assert!((o.target.x - o.current.x).abs() < 50.0);
    }

    #[test]
    fn release_coasts_then_stops() {
        let (mut engine, host, _, _) = mount(config(4, 7));
        send(&mut engine, &host, CanvasEvent::PointerDown { x: 0.0, y: 0.0 });
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 30.0, y: 0.0 });
        send(&mut engine, &host, CanvasEvent::PointerUp);
        assert!(engine.camera().is_zooming());

        let start = engine.motion().offsets().target.x;
        for _ in 0..600 {
            engine.tick(1.0 / 60.0);
        }
        assert!(engine.motion().offsets().target.x > start);
        assert_eq!(engine.motion().velocity(), Vec2::ZERO);
        assert!(!engine.camera().is_zooming());
        assert_eq!(engine.camera().z, engine.camera().rest_z());
    }

    fn hover_grid() -> CanvasConfig {
        // Two cards side by side; the center tile spans x in [-200, 200].
        config(1, 2)
    }

    const A: CardId = CardId { tile: 4, slot: 0 };
    const B: CardId = CardId { tile: 4, slot: 1 };

    #[test]
    fn hover_a_then_b_restyles_each_once() {
        let (mut engine, host, backend, _) = mount(hover_grid());
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 350.0, y: 300.0 });
        assert_eq!(engine.hovered(), Some(A));
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 345.0, y: 300.0 });
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 450.0, y: 300.0 });
        assert_eq!(engine.hovered(), Some(B));

        assert_eq!(backend.log().replaced, vec![A, A, B]);
        assert_eq!(engine.card(A).unwrap().overlay.target, 0.0);
        assert_eq!(
            engine.card(B).unwrap().overlay.target,
            engine.config().texture.hover_overlay_opacity
        );
    }

    #[test]
    fn pressing_clears_hover_and_drags_ignore_picking() {
        let (mut engine, host, backend, _) = mount(hover_grid());
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 350.0, y: 300.0 });
        send(&mut engine, &host, CanvasEvent::PointerDown { x: 350.0, y: 300.0 });
        assert_eq!(engine.hovered(), None);

        send(&mut engine, &host, CanvasEvent::PointerMove { x: 450.0, y: 300.0 });
        assert_eq!(engine.hovered(), None);
        assert_eq!(backend.log().replaced, vec![A, A]);
    }

    #[test]
    fn hovering_back_and_forth_keeps_waiters_bounded() {
        let (mut engine, host, _, _) = mount(hover_grid());
        let before = engine.textures().pending_textures();
        for i in 0..500 {
            let x = if i % 2 == 0 { 350.0 } else { 450.0 };
            send(&mut engine, &host, CanvasEvent::PointerMove { x, y: 300.0 });
        }
        assert!(
            engine.textures().pending_textures() <= before + 2,
            "waiters grew from {before} to {}",
            engine.textures().pending_textures()
        );
    }

    #[test]
    fn overlay_fades_toward_target() {
        let (mut engine, host, _, _) = mount(hover_grid());
        send(&mut engine, &host, CanvasEvent::PointerMove { x: 350.0, y: 300.0 });
        for _ in 0..200 {
            engine.tick(1.0 / 60.0);
        }
        let target = engine.config().texture.hover_overlay_opacity;
        assert_eq!(engine.card(A).unwrap().overlay.opacity, target);
    }

    #[test]
    fn thumbnail_completion_reuploads_waiting_cards() {
        let (mut engine, _host, backend, thumbs) = mount(config(1, 1));
        let url = demo_catalog()[0].image_url.clone().unwrap();
        assert_eq!(thumbs.requested(), vec![url.clone()]);

        thumbs.resolve(&url, RgbaImage::from_pixel(16, 9, image::Rgba([255, 0, 0, 255])));
        engine.tick(1.0 / 60.0);

        let log = backend.log();
        assert_eq!(log.updated.len(), 9);
        assert!(!engine.card(A).unwrap().texture.borrow().dirty);
    }
}
