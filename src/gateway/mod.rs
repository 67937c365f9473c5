//! Vault session gateway
//!
//! Owns the `bw serve` subprocess and the channel to its local REST API.
//! Callers only ever see requests and responses, never the process or socket.

mod port;
mod response;
mod session;
pub mod transport;

use async_trait::async_trait;

use crate::common::Result;

pub use port::{acquire_port, EPHEMERAL_PORTS};
pub use response::{RequestBody, Response};
pub use session::{GatewayState, VaultGateway};
pub use transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};

/// Request/response channel to the vault API
///
/// Implemented by [`VaultGateway`]; the API layer and the user flows depend on
/// this rather than on the gateway so they can be driven without a subprocess.
#[async_trait]
pub trait RequestChannel: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Response>;
}
