//! Error types for bwnote
//!
//! Messages are shown to the user as-is, so they say what to do next where
//! there is something to do.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bwnote
#[derive(Error, Debug)]
pub enum Error {
    // === Gateway Lifecycle Errors ===
    #[error("Cannot {action} while vault session is {state}")]
    InvalidState { action: String, state: String },

    #[error("Failed to start '{path}': {reason}")]
    SpawnFailed { path: String, reason: String },

    #[error("Bitwarden server did not start listening within {0} seconds")]
    StartupTimeout(u64),

    #[error("Bitwarden server exited unexpectedly ({0})")]
    ProcessExited(String),

    #[error("No free port found in {low}-{high} after {attempts} attempts")]
    NoPortAvailable { low: u16, high: u16, attempts: u32 },

    // === Request Errors ===
    #[error("Request to Bitwarden server failed: {0}")]
    Transport(String),

    #[error("Bitwarden server returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    // === Action Errors ===
    #[error("Please set the Bitwarden CLI path in the settings")]
    CliPathUnset,

    #[error("Unsupported item type: {0}")]
    UnsupportedItemType(String),

    #[error("Invalid item id '{0}'")]
    InvalidItemId(String),

    #[error("Failed to read password: {0}")]
    Prompt(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid state error
    pub fn invalid_state(action: &str, state: impl ToString) -> Self {
        Self::InvalidState {
            action: action.to_string(),
            state: state.to_string(),
        }
    }

    /// Create a spawn failure error for the given binary
    pub fn spawn_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::SpawnFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
