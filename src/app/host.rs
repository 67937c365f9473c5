//! Host lifecycle: one gateway per run, started once and torn down once

use std::sync::Arc;

use crate::common::config::Config;
use crate::common::Result;
use crate::gateway::{GatewayState, HttpTransport, Transport, VaultGateway};

use super::actions::VaultActions;
use super::ui::Ui;

/// Owns the settings and the single vault session of a host run
pub struct VaultHost {
    config: Config,
    gateway: VaultGateway,
}

impl VaultHost {
    /// Host using the direct HTTP transport
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(config.timeouts.request())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            gateway: VaultGateway::new(transport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &VaultGateway {
        &self.gateway
    }

    /// Start `bw serve` if a CLI path is configured
    ///
    /// Startup problems are logged, not returned: the user finds out when the
    /// first action's request fails.
    pub async fn start(&self) {
        let cli_path = match self.config.require_cli_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "Not starting Bitwarden server");
                return;
            }
        };

        if let Err(e) = self.gateway.initialize(&cli_path).await {
            tracing::warn!(error = %e, "Could not start Bitwarden server");
            return;
        }

        if let Err(e) = self.gateway.wait_ready(self.config.timeouts.startup()).await {
            tracing::warn!(error = %e, "Bitwarden server is not ready");
        }
    }

    /// Stop the server if it was started
    pub async fn shutdown(&self) {
        if self.gateway.state() != GatewayState::Running {
            return;
        }
        if let Err(e) = self.gateway.teardown().await {
            tracing::warn!(error = %e, "Failed to stop Bitwarden server");
        }
    }

    /// User actions bound to this host's session
    pub fn actions<'a>(&'a self, ui: Ui<'a>) -> VaultActions<'a> {
        VaultActions::new(&self.config, &self.gateway, ui)
    }
}
