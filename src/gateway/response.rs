//! Request bodies and the standard response shape returned to callers

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::transport::TransportResponse;
use crate::common::Result;

/// A request body together with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content: String,
    pub content_type: String,
}

impl RequestBody {
    pub fn new(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Serialize `value` as an `application/json` body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_string(value)?, "application/json"))
    }
}

/// Response from the vault server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    text: String,
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for any 2xx status
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

impl From<TransportResponse> for Response {
    fn from(envelope: TransportResponse) -> Self {
        let headers = envelope
            .headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status: envelope.status,
            headers,
            text: envelope.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(status: u16, text: &str) -> TransportResponse {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        TransportResponse {
            status,
            headers,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_ok_follows_status_range() {
        assert!(Response::from(envelope(200, "")).ok());
        assert!(Response::from(envelope(204, "")).ok());
        assert!(!Response::from(envelope(199, "")).ok());
        assert!(!Response::from(envelope(302, "")).ok());
        assert!(!Response::from(envelope(400, "")).ok());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = Response::from(envelope(200, "{}"));
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_json_accessor() {
        let response = Response::from(envelope(200, r#"{"success":true}"#));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["success"], true);
        assert!(Response::from(envelope(200, "not json"))
            .json::<serde_json::Value>()
            .is_err());
    }

    #[test]
    fn test_json_body() {
        let body = RequestBody::json(&serde_json::json!({ "password": "p@ss" })).unwrap();
        assert_eq!(body.content, r#"{"password":"p@ss"}"#);
        assert_eq!(body.content_type, "application/json");
    }
}
