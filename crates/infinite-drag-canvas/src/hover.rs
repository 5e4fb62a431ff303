//! Pointer hit-testing against card quads and hover enter/leave tracking.

use crate::camera::Ray;
use glam::Vec2;

/// Identity of a card instance: tile replica and slot within the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId {
    pub tile: usize,
    pub slot: usize,
}

/// Axis-aligned square card on the `z = 0` plane, in world space.
#[derive(Debug, Clone, Copy)]
pub struct CardQuad {
    pub id: CardId,
    pub center: Vec2,
    pub size: f32,
}

impl CardQuad {
    fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        let half = self.size / 2.0;
        d.x <= half && d.y <= half
    }
}

/// Nearest card hit by `ray`. Cards share one plane, so the first in
/// iteration order wins ties.
pub fn pick<I>(ray: &Ray, quads: I) -> Option<CardId>
where
    I: IntoIterator<Item = CardQuad>,
{
    let t = ray.hit_plane_z(0.0)?;
    let hit = ray.at(t).truncate();
    quads.into_iter().find(|q| q.contains(hit)).map(|q| q.id)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverTransition {
    /// Card that must be restored to its default look.
    pub left: Option<CardId>,
    /// Card that must be highlighted.
    pub entered: Option<CardId>,
}

impl HoverTransition {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.entered.is_none()
    }
}

#[derive(Debug, Default)]
pub struct HoverPicker {
    hovered: Option<CardId>,
}

impl HoverPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<CardId> {
        self.hovered
    }

    /// Moves hover to `hit`. Unchanged hover yields an empty transition.
    pub fn update(&mut self, hit: Option<CardId>) -> HoverTransition {
        if hit == self.hovered {
            return HoverTransition::default();
        }
        let left = std::mem::replace(&mut self.hovered, hit);
        HoverTransition { left, entered: hit }
    }

    pub fn clear(&mut self) -> HoverTransition {
        self.update(None)
    }
}
