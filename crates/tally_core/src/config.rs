//! Tracker configuration.
//!
//! # Responsibility
//! - Load store and logging settings from a YAML file.
//! - Fill in defaults for anything the file leaves out.
//!
//! # Invariants
//! - A missing `store_path` means an in-memory store.
//! - `log.dir` must be absolute once logging is enabled.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Settings consumed by `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String,
    pub dir: PathBuf,
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// SQLite file for the local store. `None` keeps data in memory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// File logging. `None` leaves logging uninitialized.
    #[serde(default)]
    pub log: Option<LogSettings>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(serde_yaml::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config yaml: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(ConfigError::Parse)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = self.store_path.as_ref() {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("store_path cannot be empty".to_string()));
            }
        }
        if let Some(log) = self.log.as_ref() {
            if !log.dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log.dir must be absolute, got `{}`",
                    log.dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}
