//! Board configuration
//!
//! Author-time parameters for board generation. Loaded from JSON; any field
//! left out takes its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Configuration problems
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board width {0} outside 1..=20")]
    Width(u32),
    #[error("board height {0} outside 1..=20")]
    Height(u32),
    #[error("cell radius {0} outside 0.1..=2.0")]
    Radius(f32),
    #[error("bucket sprite count must be at least 1")]
    SpriteCount,
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Board generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Columns
    pub width: u32,
    /// Rows per column
    pub height: u32,
    /// Cell radius in world units
    pub radius: f32,
    /// Fixed seed for reproducible boards (random when absent)
    pub seed: Option<u64>,
    /// Number of bucket sprite variants to cycle through
    pub bucket_sprite_count: u32,
    /// Center the camera on the generated board instead of the fixed focus
    pub center_camera: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            radius: DEFAULT_RADIUS,
            seed: None,
            bucket_sprite_count: DEFAULT_BUCKET_SPRITES,
            center_camera: false,
        }
    }
}

impl BoardConfig {
    pub fn new(width: u32, height: u32, radius: f32) -> Self {
        Self {
            width,
            height,
            radius,
            ..Default::default()
        }
    }

    /// Same board with a fixed seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = MIN_BOARD_DIM..=MAX_BOARD_DIM;
        if !dims.contains(&self.width) {
            return Err(ConfigError::Width(self.width));
        }
        if !dims.contains(&self.height) {
            return Err(ConfigError::Height(self.height));
        }
        if !self.radius.is_finite() || !(MIN_CELL_RADIUS..=MAX_CELL_RADIUS).contains(&self.radius) {
            return Err(ConfigError::Radius(self.radius));
        }
        if self.bucket_sprite_count == 0 {
            return Err(ConfigError::SpriteCount);
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded board config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BoardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(BoardConfig::new(0, 5, 0.5).validate(), Err(ConfigError::Width(0))));
        assert!(matches!(BoardConfig::new(21, 5, 0.5).validate(), Err(ConfigError::Width(21))));
        assert!(matches!(BoardConfig::new(5, 0, 0.5).validate(), Err(ConfigError::Height(0))));
        assert!(matches!(BoardConfig::new(5, 5, 0.0).validate(), Err(ConfigError::Radius(_))));
        assert!(matches!(BoardConfig::new(5, 5, f32::NAN).validate(), Err(ConfigError::Radius(_))));

        let mut config = BoardConfig::default();
        config.bucket_sprite_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::SpriteCount)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BoardConfig::from_json(r#"{ "width": 4, "seed": 12 }"#).unwrap();
        assert_eq!(config.width, 4);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.seed, Some(12));
        assert!(!config.center_camera);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(BoardConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
        assert!(matches!(BoardConfig::from_json(r#"{ "height": 40 }"#), Err(ConfigError::Height(40))));
    }

    #[test]
    fn test_missing_file() {
        let err = BoardConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
