//! Adjuster settings.
//!
//! Settings are stored as a JSON file. Every key is optional and falls back
//! to the defaults below, so an empty object is a valid configuration.
//!
//! ```json
//! {
//!   "twsCorrectionTable": "tws_correction_table.csv",
//!   "twdCorrectionTable": "twd_correction_table.csv",
//!   "polarTable": "main_jib_polars.csv",
//!   "pollIntervalMs": 200,
//!   "affectingDistance": 8.0,
//!   "channelCapacity": 1024
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::table::AFFECTING_DISTANCE;

/// Errors that can occur while loading settings.
#[derive(Debug)]
pub enum ConfigError {
    /// The settings file was not found.
    NotFound(String),
    /// Failed to read the settings file.
    ReadError(String),
    /// Settings data is invalid.
    InvalidData(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Configuration not found: {}", path),
            ConfigError::ReadError(msg) => write!(f, "Read error: {}", msg),
            ConfigError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Wind adjuster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdjusterSettings {
    /// True wind speed correction table.
    pub tws_correction_table: PathBuf,

    /// True wind direction correction table.
    pub twd_correction_table: PathBuf,

    /// Optional boat speed polar for target speeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar_table: Option<PathBuf>,

    /// How often the latest readings are sampled.
    pub poll_interval_ms: u64,

    /// Cut-off distance (grid cells) for gap filling.
    pub affecting_distance: f64,

    /// Capacity of the event inbox and the correction bus.
    pub channel_capacity: usize,
}

impl Default for AdjusterSettings {
    fn default() -> Self {
        Self {
            tws_correction_table: PathBuf::from("tws_correction_table.csv"),
            twd_correction_table: PathBuf::from("twd_correction_table.csv"),
            polar_table: None,
            poll_interval_ms: 200,
            affecting_distance: AFFECTING_DISTANCE,
            channel_capacity: 1024,
        }
    }
}

impl AdjusterSettings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file. Relative table paths are resolved against
    /// the directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::ReadError(format!("{}: {}", path.display(), e)),
        })?;
        let settings = Self::from_json(&json)?;
        Ok(match path.parent() {
            Some(base) => settings.resolve_paths(base),
            None => settings,
        })
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidData(
                "pollIntervalMs must be greater than 0".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidData(
                "channelCapacity must be greater than 0".to_string(),
            ));
        }
        if !(self.affecting_distance > 0.0) {
            return Err(ConfigError::InvalidData(
                "affectingDistance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Make relative table paths relative to `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.tws_correction_table = resolve(&self.tws_correction_table);
        self.twd_correction_table = resolve(&self.twd_correction_table);
        self.polar_table = self.polar_table.as_deref().map(resolve);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
