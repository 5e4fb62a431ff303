//! URL-keyed thumbnail cache, scoped to one texture factory.

use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum CacheEntry {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed,
}

#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<String, CacheEntry>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Records that a fetch is in flight. Returns `false` if the URL was
    /// already known, in which case no new fetch should start.
    pub fn begin(&mut self, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), CacheEntry::Pending);
        true
    }

    pub fn complete(&mut self, url: &str, image: RgbaImage) -> Arc<RgbaImage> {
        let image = Arc::new(image);
        self.entries
            .insert(url.to_string(), CacheEntry::Ready(image.clone()));
        image
    }

    pub fn fail(&mut self, url: &str) {
        self.entries.insert(url.to_string(), CacheEntry::Failed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
