//! Typed access to the Bitwarden CLI's local REST API

mod client;
pub mod types;

pub use client::VaultApi;
pub use types::{
    ItemEnvelope, ItemKind, LockStatus, Login, MessageEnvelope, StatusEnvelope, VaultItem,
};
