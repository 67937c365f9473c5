//! Vault session state machine
//!
//! A [`VaultGateway`] moves through `Uninitialized -> Running -> Terminated`
//! exactly once. While `Running` it owns the `bw serve` child and the base URL
//! bound to the child's port. Operations attempted in any other state are
//! rejected.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};

use crate::common::{Error, Result};

use super::port;
use super::response::{RequestBody, Response};
use super::transport::{HttpTransport, Method, Transport, TransportRequest};
use super::RequestChannel;

/// How long `teardown` waits after the termination signal before killing
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Interval between readiness checks
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Gateway lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// Created, no subprocess yet
    Uninitialized,
    /// `bw serve` spawned and bound to a port
    Running,
    /// Subprocess terminated; terminal state
    Terminated,
}

impl fmt::Display for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Running => write!(f, "running"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Live server process and the address it is bound to
struct ServerProcess {
    binary_path: PathBuf,
    port: u16,
    base_url: String,
    child: Child,
}

enum Lifecycle {
    Uninitialized,
    Running(ServerProcess),
    Terminated,
}

impl Lifecycle {
    fn state(&self) -> GatewayState {
        match self {
            Self::Uninitialized => GatewayState::Uninitialized,
            Self::Running(_) => GatewayState::Running,
            Self::Terminated => GatewayState::Terminated,
        }
    }
}

/// Owner of the `bw serve` subprocess and the channel to its REST API
pub struct VaultGateway {
    transport: Arc<dyn Transport>,
    lifecycle: Mutex<Lifecycle>,
    /// Held for the duration of a request; one request in flight at a time
    in_flight: tokio::sync::Mutex<()>,
}

impl VaultGateway {
    /// Create a gateway that routes requests through `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a gateway using the direct HTTP transport
    pub fn with_http(request_timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(request_timeout)?)))
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> GatewayState {
        self.lock().state()
    }

    /// Port of the running server
    pub fn port(&self) -> Option<u16> {
        match &*self.lock() {
            Lifecycle::Running(server) => Some(server.port),
            _ => None,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> Option<String> {
        match &*self.lock() {
            Lifecycle::Running(server) => Some(server.base_url.clone()),
            _ => None,
        }
    }

    /// Binary the server was started from
    pub fn binary_path(&self) -> Option<PathBuf> {
        match &*self.lock() {
            Lifecycle::Running(server) => Some(server.binary_path.clone()),
            _ => None,
        }
    }

    /// OS process id of the server, for diagnostics
    pub fn pid(&self) -> Option<u32> {
        match &*self.lock() {
            Lifecycle::Running(server) => server.child.id(),
            _ => None,
        }
    }

    /// Whether the gateway is running and its subprocess has not exited
    pub fn is_running(&self) -> bool {
        match &mut *self.lock() {
            Lifecycle::Running(server) => matches!(server.child.try_wait(), Ok(None)),
            _ => false,
        }
    }

    /// Spawn `{binary_path} serve --port {port}` on a free ephemeral port
    ///
    /// Returns the port. Must be called from within a tokio runtime.
    pub async fn initialize(&self, binary_path: impl AsRef<Path>) -> Result<u16> {
        let binary_path = binary_path.as_ref();
        let mut lifecycle = self.lock();
        if !matches!(*lifecycle, Lifecycle::Uninitialized) {
            return Err(Error::invalid_state("initialize", lifecycle.state()));
        }

        let port = port::acquire_port()?;
        let child = spawn_server(binary_path, port)?;
        let base_url = format!("http://localhost:{port}");

        tracing::info!(
            binary = %binary_path.display(),
            port,
            pid = ?child.id(),
            "Started Bitwarden server"
        );

        *lifecycle = Lifecycle::Running(ServerProcess {
            binary_path: binary_path.to_path_buf(),
            port,
            base_url,
            child,
        });

        Ok(port)
    }

    /// Wait until the server accepts TCP connections
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            let port = {
                let mut lifecycle = self.lock();
                let state = lifecycle.state();
                let Lifecycle::Running(server) = &mut *lifecycle else {
                    return Err(Error::invalid_state("wait for the server", state));
                };
                if let Ok(Some(status)) = server.child.try_wait() {
                    return Err(Error::ProcessExited(status.to_string()));
                }
                server.port
            };

            if TcpStream::connect(("localhost", port)).await.is_ok() {
                tracing::debug!(port, "Bitwarden server is accepting connections");
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(Error::StartupTimeout(timeout.as_secs()));
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Send a request to the server's REST API
    ///
    /// `path` is appended to the base URL unchanged. The body and its content
    /// type are forwarded exactly. Non-2xx responses are returned, not raised.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Response> {
        let _in_flight = self.in_flight.lock().await;

        let url = {
            let lifecycle = self.lock();
            match &*lifecycle {
                Lifecycle::Running(server) => join_url(&server.base_url, path),
                other => return Err(Error::invalid_state("send a request", other.state())),
            }
        };

        let (body, content_type) = match body {
            Some(body) => (Some(body.content), body.content_type),
            None => (None, String::new()),
        };

        tracing::debug!(%method, path, "Vault API request");
        let envelope = self
            .transport
            .send(TransportRequest {
                url,
                method,
                body,
                content_type,
                throw: false,
            })
            .await?;
        tracing::debug!(%method, path, status = envelope.status, "Vault API response");

        Ok(envelope.into())
    }

    /// Terminate the subprocess
    ///
    /// Does not wait for in-flight requests; they complete or fail on their own.
    pub async fn teardown(&self) -> Result<()> {
        let server = {
            let mut lifecycle = self.lock();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Terminated) {
                Lifecycle::Running(server) => server,
                other => {
                    let state = other.state();
                    *lifecycle = other;
                    return Err(Error::invalid_state("tear down", state));
                }
            }
        };

        tracing::info!(port = server.port, pid = ?server.child.id(), "Stopping Bitwarden server");
        terminate(server.child).await
    }
}

#[async_trait]
impl RequestChannel for VaultGateway {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Response> {
        VaultGateway::request(self, method, path, body).await
    }
}

impl Drop for VaultGateway {
    fn drop(&mut self) {
        // Best effort; we can't await in drop
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Lifecycle::Running(server) = lifecycle {
            let _ = server.child.start_kill();
        }
    }
}

fn spawn_server(binary_path: &Path, port: u16) -> Result<Child> {
    let mut cmd = Command::new(binary_path);
    cmd.arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit()) // Let bw errors reach the terminal
        .kill_on_drop(true);

    cmd.spawn()
        .map_err(|e| Error::spawn_failed(binary_path, e))
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

async fn terminate(mut child: Child) -> Result<()> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: pid belongs to a child we have not reaped yet
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!(%status, "Bitwarden server exited");
            Ok(())
        }
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => {
            tracing::warn!("Bitwarden server ignored termination signal, killing");
            child.kill().await?;
            Ok(())
        }
    }
}
