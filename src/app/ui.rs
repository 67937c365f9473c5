//! Host UI capabilities the vault flows are written against

use async_trait::async_trait;
use secrecy::SecretString;

use crate::api::VaultItem;
use crate::common::Result;

/// Transient user-facing messages
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// The unlock dialog
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    /// Ask for the master password; an empty secret means nothing was entered
    async fn read_password(&self) -> Result<SecretString>;
}

/// Read-only presentation of a revealed item
pub trait ItemView: Send + Sync {
    fn show_item(&self, item: &VaultItem);
}

/// The set of UI capabilities handed to the flows
#[derive(Clone, Copy)]
pub struct Ui<'a> {
    pub notifier: &'a dyn Notifier,
    pub prompt: &'a dyn PasswordPrompt,
    pub view: &'a dyn ItemView,
}
