// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpreter settings, stored as RON.

use crate::executor::DEFAULT_MAX_DISPATCH_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Largest accepted time scale
pub const MAX_TIME_SCALE: f32 = 10.0;

/// Settings load/save failures
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the file failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid RON for these settings
    #[error("Invalid settings document: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Encoding failed
    #[error("Failed to encode settings: {0}")]
    Encode(#[from] ron::Error),

    /// Written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// How the interpreter runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterSettings {
    /// Format version
    pub version: u32,
    /// Enter play mode as soon as the interpreter is created
    pub start_playing: bool,
    /// Multiplier applied to every delta time
    pub time_scale: f32,
    /// Bound on nested dispatches from one event node
    pub max_dispatch_depth: usize,
    /// Default log filter for hosts that install a subscriber
    pub log_level: String,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            start_playing: false,
            time_scale: 1.0,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            log_level: "info".to_string(),
        }
    }
}

impl InterpreterSettings {
    /// Set the time scale, clamped to `0..=MAX_TIME_SCALE`
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = clamp_time_scale(scale);
    }

    /// Delta time after scaling
    pub fn scaled(&self, delta_time: f32) -> f32 {
        delta_time * clamp_time_scale(self.time_scale)
    }

    /// Parse settings from a RON document
    pub fn from_ron(source: &str) -> Result<Self, SettingsError> {
        let mut settings: InterpreterSettings = ron::from_str(source)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        settings.time_scale = clamp_time_scale(settings.time_scale);
        settings.max_dispatch_depth = settings.max_dispatch_depth.max(1);
        Ok(settings)
    }

    /// Encode as pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

fn clamp_time_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(0.0, MAX_TIME_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = InterpreterSettings::default();
        settings.start_playing = true;
        settings.set_time_scale(2.0);

        let text = settings.to_ron().unwrap();
        let loaded = InterpreterSettings::from_ron(&text).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let loaded = InterpreterSettings::from_ron("(time_scale: 0.5)").unwrap();
        assert_eq!(loaded.time_scale, 0.5);
        assert_eq!(loaded.max_dispatch_depth, DEFAULT_MAX_DISPATCH_DEPTH);
        assert!(!loaded.start_playing);
    }

    #[test]
    fn test_time_scale_clamped() {
        let loaded = InterpreterSettings::from_ron("(time_scale: 50.0)").unwrap();
        assert_eq!(loaded.time_scale, MAX_TIME_SCALE);

        let mut settings = InterpreterSettings::default();
        settings.set_time_scale(-1.0);
        assert_eq!(settings.scaled(0.5), 0.0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = InterpreterSettings::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("behavior-settings-{}.ron", uuid::Uuid::new_v4()));
        let settings = InterpreterSettings {
            max_dispatch_depth: 32,
            ..Default::default()
        };

        settings.save(&path).unwrap();
        let loaded = InterpreterSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.max_dispatch_depth, 32);
    }
}
