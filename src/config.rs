use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::io::object_from_json;

/// Which point file, if any, a session writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PointSchema {
    /// position + sampled RGB color
    #[default]
    Colored,
    /// zero-padded id + position
    Compact,
    /// pose only
    Disabled,
}

impl PointSchema {
    pub fn tracks_points(&self) -> bool {
        !matches!(self, PointSchema::Disabled)
    }

    pub fn samples_color(&self) -> bool {
        matches!(self, PointSchema::Colored)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Observations below this confidence are never accumulated.
    pub confidence_threshold: f32,
    pub point_schema: PointSchema,
    /// Session directories are named `<prefix>_<timestamp>`.
    pub output_prefix: String,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            point_schema: PointSchema::Colored,
            output_prefix: "R_ARCore".to_string(),
            near_clip: 0.1,
            far_clip: 100.0,
        }
    }
}

impl LoggerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<LoggerConfig, ConfigError> {
        let config: LoggerConfig = object_from_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got near {} far {}",
                self.near_clip, self.far_clip
            )));
        }
        if self.output_prefix.is_empty() || self.output_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "output_prefix {:?} is not a plain directory name",
                self.output_prefix
            )));
        }
        Ok(())
    }
}
