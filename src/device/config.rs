//! Device configuration.
//!
//! The transfer limit is policy enforced by the device node, not by the
//! stream reader underneath it.

use crate::reader::Delivery;
use crate::source::RetryBudget;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest single read accepted by default (1 MiB).
pub const DEFAULT_MAX_TRANSFER: usize = 1024 * 1024;

/// Configuration for the rdrand device node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device node name.
    pub name: String,
    /// Permission bits of the node.
    pub mode: u32,
    /// Largest read accepted in one call, in bytes.
    pub max_transfer: usize,
    /// Hardware attempts per word.
    pub retry_budget: RetryBudget,
    /// What a failed read leaves in the caller's buffer.
    pub delivery: Delivery,
    /// Log the attach banner on load.
    pub verbose: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "rdrand".to_string(),
            mode: 0o666,
            max_transfer: DEFAULT_MAX_TRANSFER,
            retry_budget: RetryBudget::DEFAULT,
            delivery: Delivery::Partial,
            verbose: false,
        }
    }
}

impl DeviceConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() || self.name.contains('/') {
            return Err(ConfigError::InvalidName(self.name.clone()));
        }
        if self.mode > 0o777 {
            return Err(ConfigError::InvalidMode(self.mode));
        }
        if self.max_transfer == 0 {
            return Err(ConfigError::InvalidMaxTransfer);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid device name {0:?}")]
    InvalidName(String),
    #[error("invalid device mode {0:o}")]
    InvalidMode(u32),
    #[error("max transfer must be at least 1 byte")]
    InvalidMaxTransfer,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Device node settings.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Metrics exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.device.validate()?;
        Ok(config)
    }
}
