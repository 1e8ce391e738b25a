//! Demo settings with persistence
//!
//! Settings are read from `~/.config/strata/settings.toml` unless a path is
//! given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strata_core::{BlockPos, BlockRegion};
use tracing::{info, warn};

/// All demo settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub scene: SceneSettings,
}

impl Settings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("strata"))
    }

    /// Default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from the default location, or return defaults if not found.
    ///
    /// Runs before logging is set up, so problems are reported by the caller
    /// through the returned notes.
    pub fn load() -> (Self, Option<String>) {
        let Some(path) = Self::settings_path() else {
            return (
                Self::default(),
                Some("could not determine config directory".into()),
            );
        };
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(&path) {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(format!("{:#}, using defaults", e))),
        }
    }

    /// Load settings from an explicit file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("failed to parse settings {:?}", path))
    }

    /// Save settings to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Write the defaults to `path` when no settings file exists there yet.
/// Returns `true` if a file was written.
pub fn write_default_if_missing(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    Settings::default().save_to(path)?;
    Ok(true)
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

/// Demo scene settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Inclusive minimum corner of the room
    pub region_min: BlockPos,
    /// Exclusive maximum corner of the room
    pub region_max: BlockPos,
    /// Seed for ore placement
    pub seed: u64,
    /// Chance for each interior floor block to hold ore (0.0 to 1.0)
    pub ore_chance: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            region_min: BlockPos::new(-20, -12, 0),
            region_max: BlockPos::new(20, 12, 3),
            seed: 42,
            ore_chance: 0.05,
        }
    }
}

impl SceneSettings {
    /// The room as a region, validating the corners.
    pub fn region(&self) -> anyhow::Result<BlockRegion> {
        BlockRegion::new(self.region_min, self.region_max).context("invalid scene region")
    }

    /// `ore_chance` clamped into `[0, 1]`.
    pub fn ore_chance(&self) -> f64 {
        if !(0.0..=1.0).contains(&self.ore_chance) {
            warn!("ore_chance {} is out of range, clamping", self.ore_chance);
        }
        self.ore_chance.clamp(0.0, 1.0)
    }
}
