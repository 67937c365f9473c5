//! The unlock and reveal flows
//!
//! Every failure ends the triggering action after one notice. Lock state is
//! queried fresh for every action since the vault can auto-lock at any time.

use secrecy::ExposeSecret;

use crate::api::{ItemKind, StatusEnvelope, VaultApi};
use crate::common::config::Config;
use crate::common::Error;
use crate::gateway::RequestChannel;

use super::ui::Ui;

pub const NOTICE_STATUS_FAILED: &str = "Failed to get Bitwarden status";
pub const NOTICE_ALREADY_UNLOCKED: &str = "Bitwarden is already unlocked";
pub const NOTICE_EMPTY_PASSWORD: &str = "Please enter your password";
pub const NOTICE_UNLOCK_FAILED: &str = "Failed to unlock Bitwarden";
pub const NOTICE_UNLOCKED: &str = "Bitwarden unlocked successfully";
pub const NOTICE_ITEM_FAILED: &str = "Failed to get item details";
pub const NOTICE_LOCKED: &str = "Bitwarden locked";
pub const NOTICE_LOCK_FAILED: &str = "Failed to lock Bitwarden";

/// How a user action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The vault was unlocked by this action
    Unlocked,
    /// Nothing to do, the vault was not locked
    AlreadyUnlocked,
    /// The vault was locked by this action
    Locked,
    /// The item was shown
    Revealed,
    /// The action stopped after notifying the user
    Aborted,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Aborted)
    }
}

/// User actions bound to one vault session
pub struct VaultActions<'a> {
    config: &'a Config,
    api: VaultApi<'a>,
    ui: Ui<'a>,
}

impl<'a> VaultActions<'a> {
    pub fn new(config: &'a Config, channel: &'a dyn RequestChannel, ui: Ui<'a>) -> Self {
        Self {
            config,
            api: VaultApi::new(channel),
            ui,
        }
    }

    fn abort(&self, notice: &str) -> Outcome {
        self.ui.notifier.notice(notice);
        Outcome::Aborted
    }

    fn abort_with(&self, notice: &str, error: &Error) -> Outcome {
        tracing::warn!(error = %error, "{notice}");
        self.abort(notice)
    }

    /// False after notifying the user that no CLI path is configured
    fn has_cli_path(&self) -> bool {
        match self.config.require_cli_path() {
            Ok(_) => true,
            Err(e) => {
                self.abort(&e.to_string());
                false
            }
        }
    }

    /// Fresh vault status, or `None` after notifying the user of a failure
    pub async fn status(&self) -> Option<StatusEnvelope> {
        if !self.has_cli_path() {
            return None;
        }

        match self.api.status().await {
            Ok(status) if status.success => {
                tracing::debug!(status = ?status.lock_status(), "Vault status");
                Some(status)
            }
            Ok(status) => {
                tracing::warn!(message = ?status.message, "Status query unsuccessful");
                self.abort(NOTICE_STATUS_FAILED);
                None
            }
            Err(e) => {
                self.abort_with(NOTICE_STATUS_FAILED, &e);
                None
            }
        }
    }

    /// Unlock the vault if it is locked
    pub async fn unlock(&self) -> Outcome {
        match self.status().await.map(|s| s.is_locked()) {
            None => Outcome::Aborted,
            Some(true) => self.prompt_unlock().await,
            Some(false) => {
                self.ui.notifier.notice(NOTICE_ALREADY_UNLOCKED);
                Outcome::AlreadyUnlocked
            }
        }
    }

    /// Ask for the master password and unlock
    ///
    /// Callers continue only when this returns [`Outcome::Unlocked`].
    pub async fn prompt_unlock(&self) -> Outcome {
        let password = match self.ui.prompt.read_password().await {
            Ok(password) => password,
            Err(e) => return self.abort_with(NOTICE_UNLOCK_FAILED, &e),
        };
        if password.expose_secret().is_empty() {
            return self.abort(NOTICE_EMPTY_PASSWORD);
        }

        match self.api.unlock(&password).await {
            Ok(envelope) if envelope.success => {
                tracing::info!("Vault unlocked");
                self.ui.notifier.notice(NOTICE_UNLOCKED);
                Outcome::Unlocked
            }
            Ok(envelope) => {
                tracing::warn!(message = ?envelope.message, "Unlock rejected");
                self.abort(NOTICE_UNLOCK_FAILED)
            }
            Err(e) => self.abort_with(NOTICE_UNLOCK_FAILED, &e),
        }
    }

    /// Reveal an item referenced by a directive
    ///
    /// Unsupported types are rejected before anything is sent to the server.
    pub async fn reveal(&self, kind: &str, item_id: &str) -> Outcome {
        match kind.parse::<ItemKind>() {
            Ok(k) if k.is_supported() => {}
            _ => {
                let error = Error::UnsupportedItemType(kind.to_string());
                return self.abort(&error.to_string());
            }
        }

        match self.status().await.map(|s| s.is_locked()) {
            None => return Outcome::Aborted,
            Some(true) => {
                if self.prompt_unlock().await != Outcome::Unlocked {
                    return Outcome::Aborted;
                }
            }
            Some(false) => {}
        }

        self.show_item(item_id).await
    }

    /// Fetch an item and hand it to the view
    pub async fn show_item(&self, item_id: &str) -> Outcome {
        match self.api.item(item_id).await {
            Ok(envelope) => match envelope.into_item() {
                Some(item) if item.kind() != Some(ItemKind::Login) => {
                    tracing::warn!(item = %item.id, kind = ?item.kind(), "Item is not a login");
                    self.abort(NOTICE_ITEM_FAILED)
                }
                Some(item) => {
                    tracing::debug!(item = %item.id, "Revealing item");
                    self.ui.view.show_item(&item);
                    Outcome::Revealed
                }
                None => self.abort(NOTICE_ITEM_FAILED),
            },
            Err(e) => self.abort_with(NOTICE_ITEM_FAILED, &e),
        }
    }

    /// Lock the vault
    pub async fn lock(&self) -> Outcome {
        if !self.has_cli_path() {
            return Outcome::Aborted;
        }

        match self.api.lock().await {
            Ok(envelope) if envelope.success => {
                self.ui.notifier.notice(NOTICE_LOCKED);
                Outcome::Locked
            }
            Ok(envelope) => {
                tracing::warn!(message = ?envelope.message, "Lock rejected");
                self.abort(NOTICE_LOCK_FAILED)
            }
            Err(e) => self.abort_with(NOTICE_LOCK_FAILED, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::VaultItem;
    use crate::app::ui::{ItemView, Notifier, PasswordPrompt};
    use crate::common::Result;
    use crate::gateway::{Method, RequestBody, Response, TransportResponse};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Mutex;

    const ITEM_ID: &str = "0f2a6b4e-1d3c-4e5f-8a9b-c0d1e2f3a4b5";
    const NOTE_ID: &str = "9a8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d";
    const MASTER: &str = "correct horse battery staple";

    /// In-memory stand-in for `bw serve`
    struct FakeVault {
        locked: Mutex<bool>,
        status_fails: bool,
        requests: Mutex<Vec<(Method, String)>>,
    }

    impl FakeVault {
        fn new(locked: bool) -> Self {
            Self {
                locked: Mutex::new(locked),
                status_fails: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn paths(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, p)| p.clone())
                .collect()
        }
    }

    fn reply(status: u16, body: serde_json::Value) -> Result<Response> {
        Ok(TransportResponse {
            status,
            headers: Default::default(),
            text: body.to_string(),
        }
        .into())
    }

    #[async_trait]
    impl RequestChannel for FakeVault {
        async fn request(
            &self,
            method: Method,
            path: &str,
            body: Option<RequestBody>,
        ) -> Result<Response> {
            self.requests.lock().unwrap().push((method, path.to_string()));
            let mut locked = self.locked.lock().unwrap();
            match (method, path) {
                (Method::Get, "/status") if self.status_fails => {
                    Err(Error::Transport("connection refused".into()))
                }
                (Method::Get, "/status") => {
                    let status = if *locked { "locked" } else { "unlocked" };
                    reply(200, json!({"success": true, "data": {"template": {"status": status}}}))
                }
                (Method::Post, "/unlock") => {
                    let body: serde_json::Value =
                        serde_json::from_str(&body.unwrap().content).unwrap();
                    if body["password"] == MASTER {
                        *locked = false;
                        reply(200, json!({"success": true}))
                    } else {
                        reply(400, json!({"success": false, "message": "Invalid master password."}))
                    }
                }
                (Method::Post, "/lock") => {
                    *locked = true;
                    reply(200, json!({"success": true}))
                }
                (Method::Get, p) if p == format!("/object/item/{ITEM_ID}") => {
                    if *locked {
                        return reply(400, json!({"success": false, "message": "Vault is locked."}));
                    }
                    reply(200, json!({"success": true, "data": {
                        "id": ITEM_ID, "type": 1, "name": "GitHub", "notes": null,
                        "login": {"username": "octocat", "password": "s3cret"}
                    }}))
                }
                (Method::Get, p) if p == format!("/object/item/{NOTE_ID}") => {
                    reply(200, json!({"success": true, "data": {
                        "id": NOTE_ID, "type": 2, "name": "Wifi", "notes": "hunter2"
                    }}))
                }
                _ => reply(404, json!({"success": false, "message": "Not found."})),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        notices: Mutex<Vec<String>>,
        shown: Mutex<Vec<VaultItem>>,
    }

    impl Notifier for Recorder {
        fn notice(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_string());
        }
    }

    impl ItemView for Recorder {
        fn show_item(&self, item: &VaultItem) {
            self.shown.lock().unwrap().push(item.clone());
        }
    }

    struct FixedPassword(&'static str);

    #[async_trait]
    impl PasswordPrompt for FixedPassword {
        async fn read_password(&self) -> Result<SecretString> {
            Ok(SecretString::from(self.0.to_string()))
        }
    }

    fn configured() -> Config {
        Config {
            cli_path: "/usr/local/bin/bw".to_string(),
            ..Default::default()
        }
    }

    fn ui<'a>(recorder: &'a Recorder, prompt: &'a FixedPassword) -> Ui<'a> {
        Ui {
            notifier: recorder,
            prompt,
            view: recorder,
        }
    }

    #[tokio::test]
    async fn test_unlock_without_cli_path() {
        let vault = FakeVault::new(true);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = Config::default();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.unlock().await, Outcome::Aborted);
        assert_eq!(
            *recorder.notices.lock().unwrap(),
            vec![Error::CliPathUnset.to_string()]
        );
        assert!(vault.paths().is_empty());
    }

    #[tokio::test]
    async fn test_unlock_locked_vault() {
        let vault = FakeVault::new(true);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.unlock().await, Outcome::Unlocked);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_UNLOCKED]);
        assert_eq!(vault.paths(), vec!["/status", "/unlock"]);
        assert!(!*vault.locked.lock().unwrap());
    }

    #[tokio::test]
    async fn test_unlock_when_already_unlocked() {
        let vault = FakeVault::new(false);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.unlock().await, Outcome::AlreadyUnlocked);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_ALREADY_UNLOCKED]);
        assert_eq!(vault.paths(), vec!["/status"]);
    }

    #[tokio::test]
    async fn test_status_failure_aborts() {
        let mut vault = FakeVault::new(true);
        vault.status_fails = true;
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.unlock().await, Outcome::Aborted);
        assert_eq!(actions.reveal("login", ITEM_ID).await, Outcome::Aborted);
        assert_eq!(
            *recorder.notices.lock().unwrap(),
            vec![NOTICE_STATUS_FAILED, NOTICE_STATUS_FAILED]
        );
    }

    #[tokio::test]
    async fn test_empty_password_sends_nothing() {
        let vault = FakeVault::new(true);
        let recorder = Recorder::default();
        let prompt = FixedPassword("");
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.unlock().await, Outcome::Aborted);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_EMPTY_PASSWORD]);
        assert_eq!(vault.paths(), vec!["/status"]);
    }

    #[tokio::test]
    async fn test_wrong_password_skips_continuation() {
        let vault = FakeVault::new(true);
        let recorder = Recorder::default();
        let prompt = FixedPassword("wrong");
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.reveal("login", ITEM_ID).await, Outcome::Aborted);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_UNLOCK_FAILED]);
        assert!(recorder.shown.lock().unwrap().is_empty());
        // The item is never requested
        assert_eq!(vault.paths(), vec!["/status", "/unlock"]);
    }

    #[tokio::test]
    async fn test_unsupported_type_makes_no_request() {
        let vault = FakeVault::new(false);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.reveal("card", ITEM_ID).await, Outcome::Aborted);
        assert_eq!(actions.reveal("passkey", ITEM_ID).await, Outcome::Aborted);
        assert_eq!(
            *recorder.notices.lock().unwrap(),
            vec!["Unsupported item type: card", "Unsupported item type: passkey"]
        );
        assert!(vault.paths().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_locked_vault_unlocks_then_shows() {
        let vault = FakeVault::new(true);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.reveal("login", ITEM_ID).await, Outcome::Revealed);
        assert_eq!(
            vault.paths(),
            vec![
                "/status".to_string(),
                "/unlock".to_string(),
                format!("/object/item/{ITEM_ID}")
            ]
        );

        let shown = recorder.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        let login = shown[0].login.as_ref().unwrap();
        assert_eq!(login.username.as_deref(), Some("octocat"));
        assert_eq!(login.password.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_reveal_unknown_item() {
        let vault = FakeVault::new(false);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.reveal("login", "missing-item").await, Outcome::Aborted);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_ITEM_FAILED]);
    }

    #[tokio::test]
    async fn test_reveal_rejects_item_that_is_not_a_login() {
        let vault = FakeVault::new(false);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.reveal("login", NOTE_ID).await, Outcome::Aborted);
        assert_eq!(*recorder.notices.lock().unwrap(), vec![NOTICE_ITEM_FAILED]);
        assert!(recorder.shown.lock().unwrap().is_empty());
        assert_eq!(
            vault.paths(),
            vec!["/status".to_string(), format!("/object/item/{NOTE_ID}")]
        );
    }

    #[tokio::test]
    async fn test_lock() {
        let vault = FakeVault::new(false);
        let recorder = Recorder::default();
        let prompt = FixedPassword(MASTER);
        let config = configured();
        let actions = VaultActions::new(&config, &vault, ui(&recorder, &prompt));

        assert_eq!(actions.lock().await, Outcome::Locked);
        assert!(*vault.locked.lock().unwrap());
        assert!(Outcome::Locked.is_success());
        assert!(!Outcome::Aborted.is_success());
    }
}
