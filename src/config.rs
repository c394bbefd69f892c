//! Configuration management for runtime tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Frame pacing, calibration
//! sample counts, reload/footstep timings and storage locations can be
//! adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::calibration::procedure::DEFAULT_SAMPLES_NEEDED;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gesture: GestureConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

/// Detection and calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Interval between detection frames (~30 fps)
    pub frame_interval_ms: u64,
    /// Frames collected by the calibration procedure
    pub calibration_samples: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            calibration_samples: DEFAULT_SAMPLES_NEEDED,
        }
    }
}

/// Match timing and history parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between RELOAD_START and RELOAD_COMPLETE
    pub reload_ms: u64,
    /// Footstep haptic period while walking
    pub footstep_interval_ms: u64,
    /// Session snapshots kept in history
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reload_ms: 1_500,
            footstep_interval_ms: 420,
            history_capacity: 20,
        }
    }
}

/// Persistence locations; `None` keeps the data in memory only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub calibration_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist or the JSON is
    /// invalid, the default configuration is returned and a warning logged.
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    Self::sanitized(config)
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load the bundled configuration
    pub fn load() -> Self {
        Self::load_from_file("assets/gesture_config.json")
    }

    /// Clamp values that would silently disable a feature
    ///
    /// A `history_capacity` of 0 would drop every finished match; it is
    /// raised to 1 with a warning.
    pub fn sanitized(mut self) -> Self {
        if self.session.history_capacity == 0 {
            log::warn!("[Config] session.history_capacity must be at least 1; using 1");
            self.session.history_capacity = 1;
        }
        self
    }

    /// Same configuration with persistence disabled
    pub fn in_memory(mut self) -> Self {
        self.storage = StorageConfig::default();
        self
    }
}
