//! Configuration file handling
//!
//! The only setting the vault flows need is the path to the `bw` binary.
//! Timeouts are optional and default to the behaviour of an unconfigured host.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{config_path, ensure_parent_dir};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Filesystem path to the Bitwarden CLI executable
    #[serde(default)]
    pub cli_path: String,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timeouts {
    /// How long to wait for `bw serve` to accept connections
    #[serde(default = "default_startup")]
    pub startup_secs: u64,

    /// Per-request timeout, 0 disables it
    #[serde(default)]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            startup_secs: default_startup(),
            request_secs: 0,
        }
    }
}

fn default_startup() -> u64 {
    10
}

impl Timeouts {
    pub fn startup(&self) -> Duration {
        Duration::from_secs(self.startup_secs)
    }

    pub fn request(&self) -> Option<Duration> {
        (self.request_secs > 0).then(|| Duration::from_secs(self.request_secs))
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file, defaulting when it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured CLI path, if one is set
    pub fn cli_path(&self) -> Option<PathBuf> {
        let trimmed = self.cli_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Configured CLI path, or [`Error::CliPathUnset`]
    pub fn require_cli_path(&self) -> Result<PathBuf> {
        self.cli_path().ok_or(Error::CliPathUnset)
    }

    /// Best guess for the CLI location when none is configured
    ///
    /// Only used as a hint for the user; actions still require `cli_path`.
    pub fn suggested_cli_path(&self) -> Option<PathBuf> {
        self.cli_path().or_else(|| which::which("bw").ok())
    }
}
