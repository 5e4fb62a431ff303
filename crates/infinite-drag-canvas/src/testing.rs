//! Test doubles for the engine's seams.

use crate::engine::{FrameScene, SceneBackend};
use crate::host::{CanvasEvent, EventKind, ListenerId, ListenerTable, MountHost};
use crate::hover::CardId;
use crate::texture::loader::{FetchOutcome, ThumbnailError, ThumbnailSource};
use crate::texture::CardTexture;
use image::RgbaImage;
use std::cell::{Ref, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub cards: usize,
    pub vignette_aspect: f32,
    pub warp_aspect: f32,
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub live: BTreeSet<CardId>,
    pub allocations: usize,
    pub releases: usize,
    pub replaced: Vec<CardId>,
    pub updated: Vec<CardId>,
    pub resizes: Vec<(u32, u32)>,
    pub frames: Vec<FrameRecord>,
    pub detached: usize,
}

/// Backend that records every call. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend(Rc<RefCell<BackendLog>>);

impl RecordingBackend {
    pub fn log(&self) -> Ref<'_, BackendLog> {
        self.0.borrow()
    }
}

impl SceneBackend for RecordingBackend {
    type Target = ();

    fn allocate_card(&mut self, id: CardId, _texture: &CardTexture) {
        let mut log = self.0.borrow_mut();
        assert!(log.live.insert(id), "{id:?} allocated twice");
        log.allocations += 1;
    }

    fn replace_texture(&mut self, id: CardId, _texture: &CardTexture) {
        let mut log = self.0.borrow_mut();
        assert!(log.live.contains(&id), "{id:?} not allocated");
        log.replaced.push(id);
    }

    fn update_texture(&mut self, id: CardId, texture: &CardTexture) {
        assert!(texture.dirty, "{id:?} uploaded while clean");
        self.0.borrow_mut().updated.push(id);
    }

    fn release_card(&mut self, id: CardId) {
        let mut log = self.0.borrow_mut();
        assert!(log.live.remove(&id), "{id:?} released twice");
        log.releases += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.0.borrow_mut().resizes.push((width, height));
    }

    fn render(&mut self, _target: &(), scene: &FrameScene<'_>) {
        self.0.borrow_mut().frames.push(FrameRecord {
            cards: scene.cards.len(),
            vignette_aspect: scene.vignette.aspect_ratio,
            warp_aspect: scene.warp.aspect_ratio,
        });
    }

    fn detach(&mut self) {
        self.0.borrow_mut().detached += 1;
    }
}

/// Host with one named mount that counts listener traffic.
pub struct RecordingHost {
    mount_id: String,
    size: (u32, u32),
    listeners: ListenerTable,
    added: usize,
    removed: usize,
}

impl RecordingHost {
    pub fn new(mount_id: &str, width: u32, height: u32) -> Self {
        Self {
            mount_id: mount_id.to_string(),
            size: (width, height),
            listeners: ListenerTable::default(),
            added: 0,
            removed: 0,
        }
    }

    pub fn added(&self) -> usize {
        self.added
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn live(&self) -> usize {
        self.listeners.len()
    }

    pub fn dispatch(&self, event: &CanvasEvent) -> Vec<ListenerId> {
        self.listeners.targets(event.kind())
    }
}

impl MountHost for RecordingHost {
    fn mount_size(&self, mount_id: &str) -> Option<(u32, u32)> {
        (mount_id == self.mount_id).then_some(self.size)
    }

    fn add_listener(&mut self, kind: EventKind) -> ListenerId {
        self.added += 1;
        self.listeners.add(kind)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(id);
        if removed {
            self.removed += 1;
        }
        removed
    }
}

#[derive(Default)]
struct ManualState {
    requested: Vec<String>,
    ready: Vec<FetchOutcome>,
}

/// Thumbnail source completed by hand. Clones share state.
#[derive(Clone, Default)]
pub struct ManualThumbnails(Rc<RefCell<ManualState>>);

impl ManualThumbnails {
    /// Handles held outside the test, i.e. by factories.
    pub fn attached(&self) -> usize {
        Rc::strong_count(&self.0) - 1
    }

    pub fn requested(&self) -> Vec<String> {
        self.0.borrow().requested.clone()
    }

    pub fn resolve(&self, url: &str, image: RgbaImage) {
        self.0.borrow_mut().ready.push(FetchOutcome {
            url: url.to_string(),
            result: Ok(image),
        });
    }

    pub fn reject(&self, url: &str) {
        self.0.borrow_mut().ready.push(FetchOutcome {
            url: url.to_string(),
            result: Err(ThumbnailError::Unavailable("rejected".into())),
        });
    }
}

impl ThumbnailSource for ManualThumbnails {
    fn request(&mut self, url: &str) {
        self.0.borrow_mut().requested.push(url.to_string());
    }

    fn drain(&mut self) -> Vec<FetchOutcome> {
        std::mem::take(&mut self.0.borrow_mut().ready)
    }
}
