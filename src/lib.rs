//! bwnote - Bitwarden vault access for markdown notes
//!
//! This library manages a `bw serve` subprocess and exposes the unlock and
//! reveal flows on top of its local REST API.

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod common;
pub mod gateway;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use gateway::{GatewayState, VaultGateway};
