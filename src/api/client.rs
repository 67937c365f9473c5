//! Typed calls against the vault API
//!
//! Bitwarden reports failures as `{ "success": false, "message": ... }` with a
//! 4xx status, so envelopes are parsed whatever the status code. Only a body
//! that is not an envelope turns a non-2xx status into an error.

use secrecy::SecretString;
use serde::de::DeserializeOwned;

use crate::common::{Error, Result};
use crate::gateway::{Method, RequestBody, RequestChannel, Response};

use super::types::*;

/// Client for the `bw serve` endpoints used by the vault flows
pub struct VaultApi<'a> {
    channel: &'a dyn RequestChannel,
}

impl<'a> VaultApi<'a> {
    pub fn new(channel: &'a dyn RequestChannel) -> Self {
        Self { channel }
    }

    /// Query the vault lock state
    pub async fn status(&self) -> Result<StatusEnvelope> {
        let response = self.channel.request(Method::Get, "/status", None).await?;
        parse_envelope(&response)
    }

    /// Unlock the vault with the master password
    pub async fn unlock(&self, password: &SecretString) -> Result<MessageEnvelope> {
        let body = RequestBody::json(&UnlockRequest { password })?;
        let response = self
            .channel
            .request(Method::Post, "/unlock", Some(body))
            .await?;
        parse_envelope(&response)
    }

    /// Lock the vault
    pub async fn lock(&self) -> Result<MessageEnvelope> {
        let response = self.channel.request(Method::Post, "/lock", None).await?;
        parse_envelope(&response)
    }

    /// Fetch a single item by id
    pub async fn item(&self, id: &str) -> Result<ItemEnvelope> {
        validate_item_id(id)?;
        let path = format!("/object/item/{id}");
        let response = self.channel.request(Method::Get, &path, None).await?;
        parse_envelope(&response)
    }
}

fn parse_envelope<T: DeserializeOwned>(response: &Response) -> Result<T> {
    match response.json::<T>() {
        Ok(envelope) => Ok(envelope),
        Err(e) if response.ok() => Err(e),
        Err(_) => Err(Error::Api {
            status: response.status(),
            body: response.text().to_string(),
        }),
    }
}

/// Item ids are GUIDs; anything that would change the request path is rejected
fn validate_item_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidItemId(id.to_string()))
    }
}
