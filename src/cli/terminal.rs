//! Terminal implementations of the host UI capabilities

use std::io::IsTerminal;

use async_trait::async_trait;
use colored::Colorize;
use secrecy::SecretString;

use crate::api::VaultItem;
use crate::app::{ItemView, Notifier, PasswordPrompt};
use crate::common::{Error, Result};

/// Environment variable that supplies the master password non-interactively
pub const PASSWORD_ENV_VAR: &str = "BWNOTE_MASTER_PASSWORD";

/// Notices go to stderr
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notice(&self, message: &str) {
        eprintln!("{} {}", "notice:".yellow().bold(), message);
    }
}

/// Reads the master password from `BWNOTE_MASTER_PASSWORD` or the TTY
pub struct TerminalPrompt;

#[async_trait]
impl PasswordPrompt for TerminalPrompt {
    async fn read_password(&self) -> Result<SecretString> {
        if let Ok(password) = std::env::var(PASSWORD_ENV_VAR) {
            if !password.is_empty() {
                return Ok(SecretString::from(password));
            }
        }

        if !std::io::stdin().is_terminal() {
            return Err(Error::Prompt(format!(
                "no terminal available; set {PASSWORD_ENV_VAR} or run interactively"
            )));
        }

        let password = tokio::task::spawn_blocking(|| {
            eprintln!("{}", "Unlock your vault".bold());
            rpassword::prompt_password("Enter your password: ")
        })
        .await
        .map_err(|e| Error::Internal(format!("password prompt task failed: {e}")))?
        .map_err(|e| Error::Prompt(e.to_string()))?;

        Ok(SecretString::from(password))
    }
}

/// Prints the item's fields to stdout
pub struct TerminalItemView;

impl ItemView for TerminalItemView {
    fn show_item(&self, item: &VaultItem) {
        print!("{}", format_item(item));
    }
}

/// Plain-text rendering of a login item, one field per line
pub fn format_item(item: &VaultItem) -> String {
    let mut out = format!("{}\n", item.name);
    let login = item.login.clone().unwrap_or_default();
    out.push_str(&format!(
        "Username: {}\n",
        login.username.as_deref().unwrap_or("")
    ));
    out.push_str(&format!(
        "Password: {}\n",
        login.password.as_deref().unwrap_or("")
    ));
    if let Some(notes) = item.notes.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("Notes: {notes}\n"));
    }
    out
}
