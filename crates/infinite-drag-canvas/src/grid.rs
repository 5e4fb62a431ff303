//! Tile geometry: where each card sits inside one repeating tile, and where the
//! nine tile replicas sit around the tile-grid root.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Number of tile replicas along each axis of the neighborhood.
pub const NEIGHBORHOOD: i32 = 3;

/// Total number of tile replicas alive at any time.
pub const TILE_COUNT: usize = (NEIGHBORHOOD * NEIGHBORHOOD) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
    /// Edge length of one square card in world units.
    pub image_size: f32,
    /// Gap between cards. Cards currently abut; kept for tuning files.
    pub spacing: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 7,
            image_size: 200.0,
            spacing: 0.0,
        }
    }
}

impl GridConfig {
    #[inline]
    pub fn tile_width(&self) -> f32 {
        self.cols as f32 * self.image_size
    }

    #[inline]
    pub fn tile_height(&self) -> f32 {
        self.rows as f32 * self.image_size
    }

    /// Tile dimensions as a vector (width, height).
    #[inline]
    pub fn tile_size(&self) -> Vec2 {
        Vec2::new(self.tile_width(), self.tile_height())
    }

    /// Cards in one tile.
    #[inline]
    pub fn slots_per_tile(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Rejects layouts that cannot produce a tile.
    pub fn validate(&self) -> Result<(), String> {
        if self.rows == 0 || self.cols == 0 {
            return Err(format!(
                "grid must have at least one row and column (got {}x{})",
                self.rows, self.cols
            ));
        }
        if !(self.image_size.is_finite() && self.image_size > 0.0) {
            return Err(format!("image_size must be positive (got {})", self.image_size));
        }
        Ok(())
    }
}

/// Pure mapping from a linear card index to its position within one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    config: GridConfig,
}

impl GridLayout {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Center of the card at `index = row * cols + col`, relative to the tile
    /// center. Indices past `rows * cols` wrap around the tile.
    pub fn position_for(&self, index: usize) -> Vec2 {
        let cols = self.config.cols.max(1) as usize;
        let slots = self.config.slots_per_tile().max(1);
        let slot = index % slots;
        let row = (slot / cols) as f32;
        let col = (slot % cols) as f32;
        let size = self.config.image_size;

        Vec2::new(
            col * size - self.config.tile_width() / 2.0 + size / 2.0,
            self.config.tile_height() / 2.0 - row * size - size / 2.0,
        )
    }

    /// Every slot of one tile in row-major order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Vec2)> + '_ {
        (0..self.config.slots_per_tile()).map(move |i| (i, self.position_for(i)))
    }

    /// Offsets of the 3×3 replicas from the root, row-major from the top-left.
    /// Row `-1` is above the center tile, hence the negated y.
    pub fn tile_offsets(&self) -> [Vec2; TILE_COUNT] {
        let (w, h) = (self.config.tile_width(), self.config.tile_height());
        let mut out = [Vec2::ZERO; TILE_COUNT];
        let mut i = 0;
        for tile_row in -1..=1 {
            for tile_col in -1..=1 {
                out[i] = Vec2::new(tile_col as f32 * w, -(tile_row as f32) * h);
                i += 1;
            }
        }
        out
    }
}
