//! Card face rasterization.
//!
//! `CardTextureFactory` paints a card record into an RGBA image: background,
//! a 16:9 thumbnail, the upper-cased title and a row of category badges.
//! Thumbnails load asynchronously; a texture handed out while its thumbnail is
//! in flight is redrawn in place and flagged `dirty` once [`CardTextureFactory::poll`]
//! observes the result.

pub mod cache;
pub mod canvas;
pub mod loader;

use crate::cards::CardRecord;
use cache::{CacheEntry, ThumbnailCache};
use canvas::{parse_hex_color, Align, Baseline, CardCanvas};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use loader::ThumbnailSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Logical edge length of a card face.
pub const BASE_SIDE: f32 = 280.0;
/// Largest raster edge the factory will allocate.
pub const MAX_TEXTURE_SIDE: u32 = 4096;

const THUMB_WIDTH_FRACTION: f32 = 0.7;
const TEXT_COLOR: Rgba<u8> = Rgba([0xEE, 0xEE, 0xEE, 0xFF]);
const BADGE_COLOR: Rgba<u8> = Rgba([0x88, 0x88, 0x88, 0xFF]);
const BORDER_COLOR: Rgba<u8> = Rgba([0x22, 0x22, 0x22, 0xFF]);
const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x16, 0x16, 0x16, 0xFF]);
const PLACEHOLDER_TEXT: Rgba<u8> = Rgba([0x55, 0x55, 0x55, 0xFF]);
const ERROR_FILL: Rgba<u8> = Rgba([0x3A, 0x10, 0x10, 0xFF]);
const ERROR_TEXT: Rgba<u8> = Rgba([0xAA, 0x44, 0x44, 0xFF]);

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// Physical pixels per logical unit.
    pub pixel_ratio: f32,
    pub background: String,
    pub highlight: String,
    /// Opacity the thumbnail overlay fades to while hovered.
    pub hover_overlay_opacity: f32,
    /// Fraction of the remaining distance the overlay covers per frame.
    pub overlay_lerp: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            background: "#0A0A0A".into(),
            highlight: "#111111".into(),
            hover_overlay_opacity: 0.12,
            overlay_lerp: 0.1,
            font_path: None,
        }
    }
}

impl TextureSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.hover_overlay_opacity >= 0.0 && self.hover_overlay_opacity <= 1.0) {
            return Err("texture.hover_overlay_opacity must be within [0, 1]".into());
        }
        if !(self.overlay_lerp > 0.0 && self.overlay_lerp <= 1.0) {
            return Err("texture.overlay_lerp must be within (0, 1]".into());
        }
        Ok(())
    }
}

/// Thumbnail region of a card face in UV units: `[x, y, w, h]`, origin top-left.
pub fn thumbnail_region() -> [f32; 4] {
    let (x, y, w, h) = thumbnail_rect(BASE_SIDE);
    [x / BASE_SIDE, y / BASE_SIDE, w / BASE_SIDE, h / BASE_SIDE]
}

fn thumbnail_rect(side: f32) -> (f32, f32, f32, f32) {
    let padding = side * 0.06;
    let w = side * THUMB_WIDTH_FRACTION;
    let h = w * 9.0 / 16.0;
    ((side - w) / 2.0, (side - h) / 2.5 + padding / 2.0, w, h)
}

#[derive(Debug)]
pub struct CardTexture {
    pub image: RgbaImage,
    /// Set when `image` changed after the backend last uploaded it.
    pub dirty: bool,
}

impl CardTexture {
    fn new(image: RgbaImage) -> Self {
        Self { image, dirty: false }
    }

    pub fn blank() -> Self {
        Self::new(RgbaImage::new(1, 1))
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

pub type SharedTexture = Rc<RefCell<CardTexture>>;

#[derive(Debug, Clone)]
enum Thumb {
    Absent,
    Loading,
    Ready(Arc<RgbaImage>),
    Failed,
}

pub struct RenderJob<'a> {
    pub record: &'a CardRecord,
    pub index: usize,
    pub highlight: Option<Rgba<u8>>,
}

struct Waiter {
    texture: Weak<RefCell<CardTexture>>,
    record: CardRecord,
    index: usize,
    highlight: Option<Rgba<u8>>,
}

/// Borrowed, thread-safe view of what painting needs.
struct Rasterizer<'a> {
    pixel_ratio: f32,
    background: Rgba<u8>,
    font: Option<&'a Font>,
}

impl Rasterizer<'_> {
    fn side_px(&self) -> Option<u32> {
        let side = (BASE_SIDE * self.pixel_ratio).round();
        if !side.is_finite() || side < 1.0 || side > MAX_TEXTURE_SIDE as f32 {
            return None;
        }
        Some(side as u32)
    }

    fn draw(&self, record: &CardRecord, index: usize, highlight: Option<Rgba<u8>>, thumb: &Thumb) -> RgbaImage {
        let Some(side_px) = self.side_px() else {
            log::error!(
                "Card {} ({}): cannot rasterize at pixel ratio {}, using blank texture",
                index,
                record.id,
                self.pixel_ratio
            );
            return RgbaImage::new(1, 1);
        };

        let s = BASE_SIDE;
        let padding = s * 0.06;
        let mut c = CardCanvas::new(side_px, side_px as f32 / s);

        c.fill_rect(0.0, 0.0, s, s, highlight.unwrap_or(self.background));

        let (tx, ty, tw, th) = thumbnail_rect(s);
        match thumb {
            Thumb::Ready(img) => c.draw_image_cover(img, tx, ty, tw, th),
            Thumb::Absent => self.placeholder(&mut c, (tx, ty, tw, th), "16:9", PLACEHOLDER_FILL, PLACEHOLDER_TEXT),
            Thumb::Loading => self.placeholder(&mut c, (tx, ty, tw, th), "LOADING", PLACEHOLDER_FILL, PLACEHOLDER_TEXT),
            Thumb::Failed => self.placeholder(&mut c, (tx, ty, tw, th), "ERROR", ERROR_FILL, ERROR_TEXT),
        }

        let title_size = s * 0.025;
        c.fill_text(
            self.font,
            &record.title.to_uppercase(),
            title_size,
            s - padding,
            padding,
            Align::Right,
            Baseline::Top,
            TEXT_COLOR,
        );

        let cat_size = s * 0.023;
        let badge_h = cat_size + padding * 0.3;
        let badge_pad = s * 0.03;
        let badge_y = s - padding - badge_h;
        let labels: Vec<String> = record.categories.iter().map(|cat| cat.to_uppercase()).collect();
        let widths: Vec<f32> = labels
            .iter()
            .map(|label| c.measure_text(self.font, label, cat_size) + badge_pad * 2.0)
            .collect();
        let lefts = layout_badges(&widths, padding, s - padding, padding / 4.0);
        for ((label, &w), left) in labels.iter().zip(&widths).zip(lefts) {
            let Some(x) = left else {
                continue;
            };
            c.stroke_round_rect(x, badge_y, w, badge_h, badge_h / 2.0, 1.0, BADGE_COLOR);
            c.fill_text(
                self.font,
                label,
                cat_size,
                x + w / 2.0,
                badge_y + badge_h / 2.0,
                Align::Center,
                Baseline::Middle,
                BADGE_COLOR,
            );
        }

        c.stroke_rect(0.0, 0.0, s, s, 1.0, BORDER_COLOR);
        c.into_image()
    }

    fn placeholder(
        &self,
        c: &mut CardCanvas,
        (x, y, w, h): (f32, f32, f32, f32),
        label: &str,
        fill: Rgba<u8>,
        text: Rgba<u8>,
    ) {
        c.fill_rect(x, y, w, h, fill);
        c.fill_text(
            self.font,
            label,
            BASE_SIDE * 0.03,
            x + w / 2.0,
            y + h / 2.0,
            Align::Center,
            Baseline::Middle,
            text,
        );
    }
}

/// Left edge of each badge laid out from `start`, `gap` apart. A badge that
/// would reach `limit` is skipped (`None`) and later, shorter ones still fit.
fn layout_badges(widths: &[f32], start: f32, limit: f32, gap: f32) -> Vec<Option<f32>> {
    let mut x = start;
    widths
        .iter()
        .map(|&w| {
            if x + w >= limit {
                return None;
            }
            let left = x;
            x += w + gap;
            Some(left)
        })
        .collect()
}

pub struct CardTextureFactory {
    pixel_ratio: f32,
    background: Rgba<u8>,
    highlight: Rgba<u8>,
    font: Option<Arc<Font>>,
    cache: ThumbnailCache,
    /// `None` once the factory has been cleared.
    source: Option<Box<dyn ThumbnailSource>>,
    waiters: HashMap<String, Vec<Waiter>>,
}

impl CardTextureFactory {
    /// Builds a factory, loading the configured font or a system fallback.
    pub fn new(settings: &TextureSettings, source: Box<dyn ThumbnailSource>) -> Self {
        let font = load_font(settings.font_path.as_deref());
        if font.is_none() {
            log::warn!("No usable font found; cards will render without text");
        }
        Self::with_font(settings, source, font)
    }

    pub fn with_font(settings: &TextureSettings, source: Box<dyn ThumbnailSource>, font: Option<Font>) -> Self {
        let color = |value: &str, fallback: Rgba<u8>| {
            parse_hex_color(value).unwrap_or_else(|| {
                log::warn!("Invalid color '{}', using default", value);
                fallback
            })
        };
        Self {
            pixel_ratio: settings.pixel_ratio,
            background: color(&settings.background, Rgba([0x0A, 0x0A, 0x0A, 0xFF])),
            highlight: color(&settings.highlight, Rgba([0x11, 0x11, 0x11, 0xFF])),
            font: font.map(Arc::new),
            cache: ThumbnailCache::new(),
            source: Some(source),
            waiters: HashMap::new(),
        }
    }

    pub fn highlight_color(&self) -> Rgba<u8> {
        self.highlight
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Number of textures waiting for a thumbnail.
    pub fn pending_textures(&self) -> usize {
        self.waiters.values().map(Vec::len).sum()
    }

    /// Forgets every thumbnail and waiting texture and drops the source,
    /// which stops its loader. Later renders use the no-URL placeholder.
    pub fn clear(&mut self) {
        if !self.cache.is_empty() {
            log::debug!("Dropping {} cached thumbnails", self.cache.len());
        }
        self.cache.clear();
        self.waiters.clear();
        self.source = None;
    }

    fn rasterizer(&self) -> Rasterizer<'_> {
        Rasterizer {
            pixel_ratio: self.pixel_ratio,
            background: self.background,
            font: self.font.as_deref(),
        }
    }

    /// Cache lookup; starts a fetch the first time a URL is seen.
    fn resolve(&mut self, record: &CardRecord) -> Thumb {
        let Some(url) = record.image_url.as_deref() else {
            return Thumb::Absent;
        };
        match self.cache.get(url).cloned() {
            Some(CacheEntry::Ready(img)) => Thumb::Ready(img),
            Some(CacheEntry::Failed) => Thumb::Failed,
            Some(CacheEntry::Pending) => Thumb::Loading,
            None => match self.source.as_mut() {
                Some(source) => {
                    self.cache.begin(url);
                    source.request(url);
                    Thumb::Loading
                }
                None => Thumb::Absent,
            },
        }
    }

    fn wrap(&mut self, image: RgbaImage, job: &RenderJob<'_>, thumb: &Thumb) -> SharedTexture {
        let texture = Rc::new(RefCell::new(CardTexture::new(image)));
        if let (Thumb::Loading, Some(url)) = (thumb, job.record.image_url.as_ref()) {
            let waiting = self.waiters.entry(url.clone()).or_default();
            waiting.retain(|w| w.texture.strong_count() > 0);
            waiting.push(Waiter {
                texture: Rc::downgrade(&texture),
                record: job.record.clone(),
                index: job.index,
                highlight: job.highlight,
            });
        }
        texture
    }

    pub fn render(&mut self, record: &CardRecord, index: usize, highlight: Option<Rgba<u8>>) -> SharedTexture {
        let job = RenderJob { record, index, highlight };
        let thumb = self.resolve(record);
        let image = self.rasterizer().draw(record, index, highlight, &thumb);
        self.wrap(image, &job, &thumb)
    }

    /// Renders many cards, painting them in parallel.
    pub fn render_batch(&mut self, jobs: &[RenderJob<'_>]) -> Vec<SharedTexture> {
        let thumbs: Vec<Thumb> = jobs.iter().map(|job| self.resolve(job.record)).collect();

        let raster = self.rasterizer();
        let images: Vec<RgbaImage> = jobs
            .par_iter()
            .zip(thumbs.par_iter())
            .map(|(job, thumb)| raster.draw(job.record, job.index, job.highlight, thumb))
            .collect();

        images
            .into_iter()
            .zip(jobs.iter().zip(thumbs.iter()))
            .map(|(image, (job, thumb))| self.wrap(image, job, thumb))
            .collect()
    }

    /// Applies finished thumbnail loads. Returns how many live textures were redrawn.
    pub fn poll(&mut self) -> usize {
        let Some(source) = self.source.as_mut() else {
            return 0;
        };
        let mut redrawn = 0;
        for outcome in source.drain() {
            let thumb = match outcome.result {
                Ok(image) => {
                    log::debug!("Thumbnail ready: {}", outcome.url);
                    Thumb::Ready(self.cache.complete(&outcome.url, image))
                }
                Err(e) => {
                    log::warn!("Thumbnail {} failed: {}", outcome.url, e);
                    self.cache.fail(&outcome.url);
                    Thumb::Failed
                }
            };

            let Some(waiters) = self.waiters.remove(&outcome.url) else {
                continue;
            };
            let raster = self.rasterizer();
            for waiter in waiters {
                let Some(texture) = waiter.texture.upgrade() else {
                    continue;
                };
                let image = raster.draw(&waiter.record, waiter.index, waiter.highlight, &thumb);
                let mut texture = texture.borrow_mut();
                texture.image = image;
                texture.dirty = true;
                redrawn += 1;
            }
        }
        redrawn
    }
}

/// Loads `path` if given, otherwise the first readable system font.
pub fn load_font(path: Option<&Path>) -> Option<Font> {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };
    candidates.iter().find_map(|p| {
        let bytes = std::fs::read(p).ok()?;
        match Font::from_bytes(bytes, FontSettings::default()) {
            Ok(font) => {
                log::info!("Loaded card font {}", p.display());
                Some(font)
            }
            Err(e) => {
                log::warn!("Font {} unusable: {}", p.display(), e);
                None
            }
        }
    })
}
