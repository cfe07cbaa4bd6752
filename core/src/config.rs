//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for application settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capture::{
    CameraDevices, DEFAULT_TIGHTENING, GUIDE_FRACTION, GUIDE_MAX_PX, OUTPUT_SIZE,
    StillImageCamera, TestPatternCamera,
};
use crate::monster::BodyShape;
use crate::parts::MouthStyle;

const CONFIG_FILE: &str = "config.toml";

/// Application configuration.
///
/// Contains all user-configurable settings organized into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Window and rendering settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Skin camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Starting state of the builder
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Whether to start in fullscreen mode (default: false)
    #[serde(default)]
    pub fullscreen: bool,
    /// Viewport render resolution relative to the window (default: 1.0, range: 0.25-2.0)
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
}

/// Where skin photos come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CameraSource {
    /// Synthetic animated pattern
    #[default]
    TestPattern,
    /// An image file presented as a camera (`image_path`)
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub source: CameraSource,
    /// Image used when `source = "image"`
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    /// Side of the square skin texture in pixels (default: 1024)
    #[serde(default = "default_output_size")]
    pub output_size: u32,
    /// Capture square relative to the guide circle (default: 0.9)
    #[serde(default = "default_tightening")]
    pub tightening: f32,
    /// Largest guide diameter in screen pixels (default: 400)
    #[serde(default = "default_guide_max_px")]
    pub guide_max_px: f32,
    /// Guide diameter as a fraction of the viewport width (default: 0.8)
    #[serde(default = "default_guide_fraction")]
    pub guide_fraction: f32,
    /// Clear the corners outside the guide circle (default: false)
    #[serde(default)]
    pub circular_mask: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Body preselected on the selection screen
    #[serde(default)]
    pub default_body: BodyShape,
    #[serde(default)]
    pub mouth_style: MouthStyle,
    /// Idle breathing animation (default: true)
    #[serde(default = "default_true")]
    pub breathing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Export folder; the platform data directory when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
fn default_render_scale() -> f32 {
    1.0
}
fn default_output_size() -> u32 {
    OUTPUT_SIZE
}
fn default_tightening() -> f32 {
    DEFAULT_TIGHTENING
}
fn default_guide_max_px() -> f32 {
    GUIDE_MAX_PX
}
fn default_guide_fraction() -> f32 {
    GUIDE_FRACTION
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            render_scale: default_render_scale(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraSource::default(),
            image_path: None,
            output_size: default_output_size(),
            tightening: default_tightening(),
            guide_max_px: default_guide_max_px(),
            guide_fraction: default_guide_fraction(),
            circular_mask: false,
        }
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_body: BodyShape::default(),
            mouth_style: MouthStyle::default(),
            breathing: default_true(),
        }
    }
}

impl VideoConfig {
    /// Render scale limited to the supported range
    pub fn clamped_render_scale(&self) -> f32 {
        if self.render_scale.is_finite() {
            self.render_scale.clamp(0.25, 2.0)
        } else {
            default_render_scale()
        }
    }
}

impl CameraConfig {
    /// Camera provider for the configured source.
    ///
    /// Falls back to the test pattern when `source = "image"` has no path.
    pub fn devices(&self) -> Arc<dyn CameraDevices> {
        match (self.source, &self.image_path) {
            (CameraSource::Image, Some(path)) => Arc::new(StillImageCamera::new(path)),
            (CameraSource::Image, None) => {
                tracing::warn!("camera.source is \"image\" but camera.image_path is unset");
                Arc::new(TestPatternCamera::default())
            }
            (CameraSource::TestPattern, _) => Arc::new(TestPatternCamera::default()),
        }
    }

    /// Guide diameter for a viewport of the given width
    pub fn guide_size(&self, viewport_width: f32) -> f32 {
        (viewport_width * self.guide_fraction).min(self.guide_max_px)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/monster-builder`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "monster-builder", "monster-builder")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (exports live here).
///
/// On Linux: `~/.local/share/monster-builder`
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "monster-builder", "monster-builder")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    config_dir()
        .map(|dir| load_from(&dir.join(CONFIG_FILE)))
        .unwrap_or_default()
}

/// Loads a configuration file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &Config) -> Result<()> {
    let dir = config_dir().context("Failed to get project directories")?;
    save_to(config, &dir.join(CONFIG_FILE))
}

/// Writes the configuration to `path`, creating parent directories.
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).context("Failed to create config directory")?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
