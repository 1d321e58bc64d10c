//! Server configuration
//!
//! Load order: built-in defaults, then an optional JSON file, then
//! environment variables. The file is `$DATA_PLATFORM_CONFIG` when set,
//! otherwise `<config dir>/data-platform/config.json` (for example
//! `~/.config/data-platform/config.json` on Linux) if it exists.

use crate::datastore::DEFAULT_MAX_ROWS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "DATA_PLATFORM_CONFIG";
pub const ENV_MAX_ROWS: &str = "DATA_PLATFORM_MAX_ROWS";
pub const ENV_ROW_LIMIT_POLICY: &str = "DATA_PLATFORM_ROW_LIMIT_POLICY";
pub const ENV_IO_TIMEOUT_SECS: &str = "DATA_PLATFORM_IO_TIMEOUT_SECS";
pub const ENV_PROJECT_DIRS: &str = "DATA_PLATFORM_PROJECT_DIRS";

const DEFAULT_IO_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid_value(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// What ingest does when a parsed file exceeds the row ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowLimitPolicy {
    /// Store the table and return a warning
    #[default]
    Warn,
    /// Refuse the load; nothing is stored
    Reject,
}

impl FromStr for RowLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(RowLimitPolicy::Warn),
            "reject" => Ok(RowLimitPolicy::Reject),
            _ => Err("expected 'warn' or 'reject'".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPlatformConfig {
    /// Row-count ceiling checked on ingest
    pub max_rows: usize,

    pub row_limit_policy: RowLimitPolicy,

    /// Timeout for one file read or write
    pub io_timeout_secs: u64,

    /// Directories searched for relative input paths; the first one also
    /// receives relative output paths
    pub project_dirs: Vec<PathBuf>,
}

impl Default for DataPlatformConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            row_limit_policy: RowLimitPolicy::Warn,
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
            project_dirs: Vec::new(),
        }
    }
}

impl DataPlatformConfig {
    /// Load from the process environment and the config file
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for environment variables
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup(ENV_CONFIG_PATH) {
            Some(path) => Some(PathBuf::from(path)),
            None => default_config_path().filter(|path| path.is_file()),
        };
        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_ROWS) {
            self.max_rows = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_value(ENV_MAX_ROWS, &value, "expected a positive integer"))?;
        }
        if let Some(value) = lookup(ENV_ROW_LIMIT_POLICY) {
            self.row_limit_policy = value
                .parse()
                .map_err(|reason: String| ConfigError::invalid_value(ENV_ROW_LIMIT_POLICY, &value, reason))?;
        }
        if let Some(value) = lookup(ENV_IO_TIMEOUT_SECS) {
            self.io_timeout_secs = value.trim().parse().map_err(|_| {
                ConfigError::invalid_value(ENV_IO_TIMEOUT_SECS, &value, "expected a number of seconds")
            })?;
        }
        if let Some(value) = lookup(ENV_PROJECT_DIRS) {
            self.project_dirs = std::env::split_paths(&value)
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == 0 {
            return Err(ConfigError::Invalid(
                "max_rows must be greater than 0".to_string(),
            ));
        }
        if self.io_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "io_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("data-platform").join("config.json"))
}
