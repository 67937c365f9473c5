//! Host-side call sites of the vault gateway
//!
//! The host shows notices, asks for the master password and renders items;
//! these modules decide when to do which.

pub mod actions;
pub mod directive;
mod host;
pub mod ui;

pub use actions::{Outcome, VaultActions};
pub use directive::{scan, Directive, DirectiveSource};
pub use host::VaultHost;
pub use ui::{ItemView, Notifier, PasswordPrompt, Ui};
