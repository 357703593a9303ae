/// Application settings
///
/// Settings are stored as JSON in the user's config directory:
/// - Linux: ~/.config/pixelpro/settings.json
/// - macOS: ~/Library/Application Support/pixelpro/settings.json
/// - Windows: %APPDATA%\pixelpro\settings.json
///
/// A missing file means defaults. Every field has a default so older files
/// keep loading after new fields are added.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Tiling parameters for inference on large pictures
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TilingSettings {
    /// Split large inputs into tiles at all
    pub enabled: bool,
    /// Tile side length in input pixels
    pub tile: u32,
    /// Context margin added around each tile, cropped away after inference
    pub pad: u32,
    /// Inputs with more pixels than this are tiled
    pub threshold_pixels: u64,
}

impl Default for TilingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tile: 256,
            pad: 16,
            threshold_pixels: 512 * 512,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Root of the timestamped generation directories
    pub gallery_root: PathBuf,
    /// Directory holding `EDSR_<scale>x.onnx`
    pub models_dir: PathBuf,
    /// Width of the focal-point picker preview, in screen pixels
    pub preview_width: u32,
    /// Initial zoom percentage in the gallery (0-100)
    pub default_zoom: u8,
    pub tiling: TilingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gallery_root: PathBuf::from("Picture_Gallery"),
            models_dir: PathBuf::from("Models"),
            preview_width: 190,
            default_zoom: 50,
            tiling: TilingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when the file is unreadable. A missing file is created with the
    /// defaults so there is something to edit.
    pub fn load() -> Self {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("⚠️  {}, using default settings", e);
                return Self::default();
            }
        };

        if !path.exists() {
            let settings = Self::default();
            match settings.save_to(&path) {
                Ok(()) => tracing::info!("⚙️  Wrote default settings to {}", path.display()),
                Err(e) => tracing::warn!("⚠️  Could not write {}: {}", path.display(), e),
            }
            return settings;
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("⚠️  Could not load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings = serde_json::from_str(&json)?;
        settings.default_zoom = settings.default_zoom.min(100);

        tracing::info!("⚙️  Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Write settings to an explicit file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Get the path where the settings file lives
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(ConfigError::NoConfigDir)?;

        path.push("pixelpro");
        path.push("settings.json");
        Ok(path)
    }
}
