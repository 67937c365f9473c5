//! Injected network capability
//!
//! The gateway never opens sockets for API calls itself. Every request is
//! re-expressed as a [`TransportRequest`] and handed to a [`Transport`], which
//! returns the raw envelope. Hosts that sandbox networking supply their own
//! implementation; everything else uses [`HttpTransport`].

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::{Error, Result};

/// HTTP methods used against the vault API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request as handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Absolute URL
    pub url: String,
    pub method: Method,
    /// Raw body, passed through untouched
    pub body: Option<String>,
    /// Content-Type header value, empty when there is no body
    pub content_type: String,
    /// Whether a non-2xx status should be reported as an error
    pub throw: bool,
}

/// The transport's response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub text: String,
}

/// Network primitive the gateway routes every request through
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Direct HTTP transport backed by reqwest
///
/// Redirects are never followed and system proxies are ignored, since the only
/// peer is a loopback server.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self.client.request(request.method.into(), &request.url);
        if !request.content_type.is_empty() {
            builder = builder.header(reqwest::header::CONTENT_TYPE, &request.content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let text = response.text().await?;

        if request.throw && !(200..300).contains(&status) {
            return Err(Error::Api { status, body: text });
        }

        Ok(TransportResponse {
            status,
            headers,
            text,
        })
    }
}
