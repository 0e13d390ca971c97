//! Dispatcher configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::Hours;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Round-trip travel overhead added to every task without its own value.
    pub travel_hours: Hours,

    /// Ceiling for engineers registered without an explicit daily limit.
    pub default_max_hours_per_day: Hours,

    /// Ceiling for engineers registered without an explicit weekly limit.
    pub default_max_hours_per_week: Hours,

    /// An engineer whose daily load exceeds `max_hours_per_day * overload_ratio`
    /// counts as overloaded in workload stats.
    pub overload_ratio: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            travel_hours: Hours::whole(2),
            default_max_hours_per_day: Hours::whole(10),
            default_max_hours_per_week: Hours::whole(40),
            overload_ratio: 0.8,
        }
    }
}

impl DispatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DispatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.overload_ratio > 0.0 && self.overload_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "overload_ratio must be in (0, 1], got {}",
                self.overload_ratio
            )));
        }
        if self.default_max_hours_per_day.is_zero() {
            return Err(ConfigError::Invalid(
                "default_max_hours_per_day must be positive".to_string(),
            ));
        }
        if self.default_max_hours_per_week < self.default_max_hours_per_day {
            return Err(ConfigError::Invalid(
                "default_max_hours_per_week is below the daily ceiling".to_string(),
            ));
        }
        Ok(())
    }
}
