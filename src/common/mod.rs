//! Common utilities shared by the gateway, the API layer and the CLI host

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
