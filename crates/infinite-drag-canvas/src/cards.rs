//! Card content consumed by the engine. Records are read-only and addressed
//! by `index mod len`, so a short catalog tiles across any number of cards.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read card catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("card catalog {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Record backing card `index`, if the catalog has any.
pub fn record_for(records: &[CardRecord], index: usize) -> Option<&CardRecord> {
    if records.is_empty() {
        return None;
    }
    records.get(index % records.len())
}

/// Loads a JSON array of card records.
pub fn load_catalog(path: &Path) -> Result<Vec<CardRecord>, CatalogError> {
    let shown = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: shown.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Parse { path: shown, source })
}

/// Catalog used when none is supplied on the command line.
pub fn demo_catalog() -> Vec<CardRecord> {
    const DEMO: [(&str, &str, [&str; 2]); 8] = [
        ("proj1", "Eco Innovate", ["Sustainability", "Tech"]),
        ("proj2", "Artistic Visions", ["Art", "Design"]),
        ("proj3", "Space Explorer", ["Sci-Fi", "Game"]),
        ("proj4", "Culinary Delights", ["Food", "Lifestyle"]),
        ("proj5", "Urban Renewal", ["Architecture", "City"]),
        ("proj6", "AI Frontiers", ["AI", "Research"]),
        ("proj7", "Deep Sea Odyssey", ["Nature", "Exploration"]),
        ("proj8", "Musical Journeys", ["Music", "Events"]),
    ];

    DEMO.iter()
        .map(|(id, title, categories)| CardRecord {
            id: (*id).to_string(),
            title: (*title).to_string(),
            categories: categories.iter().map(|c| (*c).to_string()).collect(),
            image_url: Some(format!("https://picsum.photos/seed/{id}/320/180")),
            description: None,
        })
        .collect()
}
