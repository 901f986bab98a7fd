//! Configuration for connection snapping

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a [`ConnectionConfig`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid snap radius {0}: must be finite and non-negative")]
    InvalidSnapRadius(f32),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Tunables for the connection manager and drag sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Maximum distance, in canvas units, at which a dragged connection snaps
    pub snap_radius: f32,

    /// Whether snap searches may propose shadow connects
    pub allow_shadow_snapping: bool,

    /// Initial capacity hint for each sorted list of a new group
    pub list_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            snap_radius: 25.0,
            allow_shadow_snapping: false,
            list_capacity: 0,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snap radius
    pub fn with_snap_radius(mut self, radius: f32) -> Self {
        self.snap_radius = radius;
        self
    }

    /// Allow or forbid shadow snapping
    pub fn with_shadow_snapping(mut self, allow: bool) -> Self {
        self.allow_shadow_snapping = allow;
        self
    }

    /// Set the initial list capacity hint
    pub fn with_list_capacity(mut self, capacity: usize) -> Self {
        self.list_capacity = capacity;
        self
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ConnectionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.snap_radius.is_finite() || self.snap_radius < 0.0 {
            return Err(ConfigError::InvalidSnapRadius(self.snap_radius));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert_eq!(config.snap_radius, 25.0);
        assert!(!config.allow_shadow_snapping);
        assert_eq!(config.list_capacity, 0);
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::new()
            .with_snap_radius(40.0)
            .with_shadow_snapping(true)
            .with_list_capacity(64);
        assert_eq!(config.snap_radius, 40.0);
        assert!(config.allow_shadow_snapping);
        assert_eq!(config.list_capacity, 64);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ConnectionConfig::from_toml_str("snap_radius = 12.5").unwrap();
        assert_eq!(config.snap_radius, 12.5);
        assert!(!config.allow_shadow_snapping);
    }

    #[test]
    fn test_from_toml_full() {
        let source = r#"
            snap_radius = 30.0
            allow_shadow_snapping = true
            list_capacity = 128
        "#;
        let config = ConnectionConfig::from_toml_str(source).unwrap();
        assert_eq!(
            config,
            ConnectionConfig::new()
                .with_snap_radius(30.0)
                .with_shadow_snapping(true)
                .with_list_capacity(128)
        );
    }

    #[test]
    fn test_from_toml_rejects_bad_input() {
        assert!(matches!(
            ConnectionConfig::from_toml_str("snap_radius = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            ConnectionConfig::from_toml_str("snap_radius = -1.0"),
            Err(ConfigError::InvalidSnapRadius(-1.0))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConnectionConfig::load("/nonexistent/connections.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
