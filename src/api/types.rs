//! Envelopes of the `bw serve` Vault Management API
//!
//! Only the fields the flows read are modelled; everything else is ignored.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::common::Error;

/// Vault lock state as reported by `GET /status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Locked,
    Unlocked,
    Unauthenticated,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// `GET /status` response
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<StatusData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    #[serde(default)]
    pub template: Option<StatusTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTemplate {
    pub status: LockStatus,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl StatusEnvelope {
    fn template(&self) -> Option<&StatusTemplate> {
        self.data.as_ref()?.template.as_ref()
    }

    pub fn lock_status(&self) -> Option<LockStatus> {
        self.template().map(|t| t.status)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_status() == Some(LockStatus::Locked)
    }

    pub fn user_email(&self) -> Option<&str> {
        self.template()?.user_email.as_deref()
    }
}

/// `POST /unlock` body
#[derive(Serialize)]
pub struct UnlockRequest<'a> {
    #[serde(serialize_with = "expose")]
    pub password: &'a SecretString,
}

fn expose<S: Serializer>(secret: &&SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Response of action endpoints such as `/unlock` and `/lock`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<MessageData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /object/item/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct ItemEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<VaultItem>,
}

impl ItemEnvelope {
    /// The item, if the server reported success and sent one
    pub fn into_item(self) -> Option<VaultItem> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// A vault item
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VaultItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<u8>,
    #[serde(default)]
    pub login: Option<Login>,
}

impl VaultItem {
    pub fn kind(&self) -> Option<ItemKind> {
        self.item_type.map(ItemKind::from_code)
    }
}

/// Login credentials of an item
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Login {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub totp: Option<String>,
    #[serde(default)]
    pub uris: Vec<LoginUri>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoginUri {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Item types known to Bitwarden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Login,
    SecureNote,
    Card,
    Identity,
    Other(u8),
}

impl ItemKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Login,
            2 => Self::SecureNote,
            3 => Self::Card,
            4 => Self::Identity,
            other => Self::Other(other),
        }
    }

    /// Only logins can be revealed
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// Button label, e.g. "Show Login"
    pub fn show_label(&self) -> String {
        format!("Show {}", capitalize(&self.to_string()))
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::SecureNote => write!(f, "note"),
            Self::Card => write!(f, "card"),
            Self::Identity => write!(f, "identity"),
            Self::Other(code) => write!(f, "type {}", code),
        }
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "note" => Ok(Self::SecureNote),
            "card" => Ok(Self::Card),
            "identity" => Ok(Self::Identity),
            other => Err(Error::UnsupportedItemType(other.to_string())),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
