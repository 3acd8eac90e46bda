//! Player preferences
//!
//! Persisted separately from board configuration as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Background music on/off
    pub music_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_enabled: true,
        }
    }
}

impl Settings {
    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn is_muted(&self) -> bool {
        self.master_volume <= 0.5
    }

    /// Flip between silent and full volume. Returns the new volume.
    pub fn toggle_audio(&mut self) -> f32 {
        self.master_volume = if self.master_volume > 0.5 { 0.0 } else { 1.0 };
        log::info!("Audio volume set to {}", self.master_volume);
        self.master_volume
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&json)?;
        settings.set_master_volume(settings.master_volume);
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
