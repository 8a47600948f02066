//! JSON configuration for a [`crate::Station`].

use std::fs;
use std::path::{Path, PathBuf};

use artrack_grid::{GridParams, DEFAULT_POINTS_PATH};
use artrack_record::{ExportOptions, TrackerParams};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Binarisation threshold handed to the detector at startup.
pub const DEFAULT_THRESHOLD: u8 = 85;

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_grid_points_path() -> PathBuf {
    PathBuf::from(DEFAULT_POINTS_PATH)
}

/// Everything a station needs besides its clock and save dialog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default)]
    pub tracker: TrackerParams,
    #[serde(default)]
    pub export: ExportOptions,
    #[serde(default)]
    pub grid: GridParams,
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_grid_points_path")]
    pub grid_points_path: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerParams::default(),
            export: ExportOptions::default(),
            grid: GridParams::default(),
            threshold: DEFAULT_THRESHOLD,
            grid_points_path: default_grid_points_path(),
        }
    }
}

impl StationConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
