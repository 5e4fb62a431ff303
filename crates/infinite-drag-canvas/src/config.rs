use crate::{
    camera::CameraConfig, grid::GridConfig, motion::MotionConfig, post::PostParams,
    post::WarpBoundary, texture::TextureSettings,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `infinite-drag-canvas` - An endlessly pannable wall of project cards.
///
/// Drag to pan; release to coast. The grid wraps around so it never ends.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON array of card records. The built-in demo catalog is used if omitted.
    #[arg(long, env = "CANVAS_CARDS")]
    pub cards: Option<PathBuf>,

    /// JSON tuning file with `grid`, `motion`, `camera`, `post` and `texture`
    /// sections. Every field is optional.
    #[arg(long, env = "CANVAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// TrueType font used for card text.
    #[arg(long, env = "CANVAS_FONT")]
    pub font: Option<PathBuf>,

    #[arg(long)]
    pub rows: Option<u32>,

    #[arg(long)]
    pub cols: Option<u32>,

    /// Card edge length in world units.
    #[arg(long)]
    pub image_size: Option<f32>,

    /// How the lens warp treats samples outside the frame: `wrap` or `fallback`.
    #[arg(long)]
    pub warp_boundary: Option<WarpBoundary>,

    /// Hide the tuning panel.
    #[arg(long)]
    pub no_hud: bool,

    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub grid: GridConfig,
    pub motion: MotionConfig,
    pub camera: CameraConfig,
    pub post: PostParams,
    pub texture: TextureSettings,
}

impl CanvasConfig {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        Self::from_json(&text, &shown)
    }

    /// Defaults, overlaid by the tuning file, overlaid by CLI flags.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(rows) = args.rows {
            config.grid.rows = rows;
        }
        if let Some(cols) = args.cols {
            config.grid.cols = cols;
        }
        if let Some(size) = args.image_size {
            config.grid.image_size = size;
        }
        if let Some(boundary) = args.warp_boundary {
            config.post.warp_boundary = boundary;
        }
        if let Some(font) = &args.font {
            config.texture.font_path = Some(font.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate().map_err(ConfigError::Invalid)?;
        self.motion.validate().map_err(ConfigError::Invalid)?;
        self.texture.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_is_all_defaults() {
        assert_eq!(CanvasConfig::from_json("{}", "test").unwrap(), CanvasConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CanvasConfig::from_json(
            r#"{"grid": {"rows": 2}, "post": {"warp_boundary": "fallback"}}"#,
            "test",
        )
        .unwrap();
        assert_eq!(config.grid.rows, 2);
        assert_eq!(config.grid.cols, GridConfig::default().cols);
        assert_eq!(config.post.warp_boundary, WarpBoundary::Fallback);
    }

    #[test]
    fn degenerate_grid_is_rejected() {
        let err = CanvasConfig::from_json(r#"{"grid": {"cols": 0}}"#, "test").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn cli_flags_override_file_and_defaults() {
        let args = Args::parse_from([
            "canvas",
            "--rows",
            "3",
            "--image-size",
            "150",
            "--warp-boundary",
            "fallback",
        ]);
        let config = CanvasConfig::resolve(&args).unwrap();
        assert_eq!(config.grid.rows, 3);
        assert_eq!(config.grid.image_size, 150.0);
        assert_eq!(config.post.warp_boundary, WarpBoundary::Fallback);
        assert_eq!((args.width, args.height), (1280, 720));
    }

    #[test]
    fn bad_json_names_its_origin() {
        let err = CanvasConfig::from_json("{", "tuning.json").unwrap_err();
        assert!(err.to_string().contains("tuning.json"));
    }
}
