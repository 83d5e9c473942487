// CLASSIFICATION: COMMUNITY
// Filename: client.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Command dispatch context.
//!
//! [`CyClient`] owns the channel, connectivity mode and sandbox records and
//! routes every request either straight to CyREST or through the bridge.
//! Most programs use the process-wide [`CyClient::shared`] instance; tests
//! and embedders build their own with [`CyClient::with_transports`].

use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::channel::{Channel, ChannelSlot};
use crate::config::ClientConfig;
use crate::envelope::CyResponse;
use crate::error::{CyError, CyResult};
use crate::mode::{ConnectivityMode, ModeDetector};
use crate::relay::RelayTransport;
use crate::sandbox::{SandboxIdentity, SandboxOptions, SandboxState, PREDEFINED_SANDBOX_NAME};
use crate::transport::{HttpRequest, HttpTransport, UreqTransport};

static SHARED: Lazy<CyClient> = Lazy::new(|| CyClient::new(ClientConfig::from_env()));

/// Dispatch context for one Cytoscape session.
pub struct CyClient {
    config: ClientConfig,
    direct: Arc<dyn HttpTransport>,
    relay: RelayTransport,
    channel: ChannelSlot,
    mode: ModeDetector,
    sandbox: SandboxState,
}

impl CyClient {
    pub fn new(config: ClientConfig) -> Self {
        let http: Arc<dyn HttpTransport> = Arc::new(UreqTransport::new());
        Self::with_transports(config, http.clone(), http)
    }

    /// Build a client over explicit transports for direct and bridge traffic.
    pub fn with_transports(
        config: ClientConfig,
        direct: Arc<dyn HttpTransport>,
        bridge: Arc<dyn HttpTransport>,
    ) -> Self {
        let relay = RelayTransport::new(config.bridge_root(), bridge);
        let mode = ModeDetector::new(config.notebook);
        Self {
            config,
            direct,
            relay,
            channel: ChannelSlot::new(),
            mode,
            sandbox: SandboxState::new(),
        }
    }

    /// Process-wide client configured from the environment.
    pub fn shared() -> &'static CyClient {
        &SHARED
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn channels(&self) -> &ChannelSlot {
        &self.channel
    }

    pub fn sandbox_state(&self) -> &SandboxState {
        &self.sandbox
    }

    /// Override notebook-host detection, returning the previous value.
    pub fn set_notebook(&self, notebook: bool) -> bool {
        let previous = self.mode.set_notebook(notebook);
        info!("notebook hosting set to {notebook} (was {previous})");
        previous
    }

    /// Resolve the connectivity mode, probing on the first calls only.
    pub fn connectivity_mode(&self) -> CyResult<ConnectivityMode> {
        let probe = HttpRequest::get(self.config.base_root())
            .with_header("Content-Type", "application/json");
        self.mode.detect(
            || {
                let request = probe.clone().with_timeout(self.config.probe_timeout());
                match self.direct.send(&request) {
                    Ok(resp) => {
                        debug!("local probe answered {}", resp.status);
                        true
                    }
                    Err(e) => {
                        debug!("local probe failed: {e}");
                        false
                    }
                }
            },
            || match self.channel.current_or_new().and_then(|ch| self.relay.request(&probe, ch)) {
                Ok(resp) => {
                    debug!("relayed probe answered {}", resp.status_code);
                    true
                }
                Err(e) => {
                    warn!("relayed probe failed: {e}");
                    false
                }
            },
        )
    }

    /// Dispatch `request` by connectivity mode without sandbox setup.
    pub fn execute(&self, request: &HttpRequest) -> CyResult<CyResponse> {
        if request.json.is_some() && request.data.is_some() {
            return Err(CyError::Encoding {
                url: request.url.clone(),
                reason: "both json and raw body supplied".into(),
            });
        }
        match self.connectivity_mode()? {
            ConnectivityMode::Unknown => Err(CyError::ModeUndetermined),
            ConnectivityMode::Local => self
                .direct
                .send(request)
                .map(|resp| CyResponse::from_http(request.url.clone(), resp))
                .map_err(|e| CyError::Transport {
                    url: request.url.clone(),
                    reason: e.to_string(),
                }),
            ConnectivityMode::Remote => {
                let channel = self.channel.current_or_new()?;
                self.relay.request(request, channel)
            }
        }
    }

    /// Make sure the sandbox is initialized, then dispatch `request`.
    pub fn do_request(&self, request: &HttpRequest) -> CyResult<CyResponse> {
        self.ensure_sandbox()?;
        self.execute(request)
    }

    /// Initialize the sandbox for the resolved mode if not done yet.
    pub fn ensure_sandbox(&self) -> CyResult<SandboxIdentity> {
        let mode = self.connectivity_mode()?;
        self.sandbox
            .ensure_initialized(mode, |options| self.provision_sandbox(options))
    }

    /// Ask Cytoscape to create or select the sandbox named in `options`.
    fn provision_sandbox(&self, options: &SandboxOptions) -> CyResult<SandboxIdentity> {
        let name = options.sandbox_name.as_deref().ok_or(CyError::NoSandbox)?;
        let cmd = format!(
            "filetransfer setSandbox sandboxName=\"{name}\" copySamples={} reinitialize={}",
            options.copy_samples, options.reinitialize
        );
        let data = self.command_post(&cmd, "sandbox_set")?;
        let path = data
            .get("sandboxPath")
            .and_then(Value::as_str)
            .map(str::to_string);
        info!("sandbox {name} at {path:?}");
        Ok(SandboxIdentity::new(Some(name.to_string()), path))
    }

    /// Select a sandbox explicitly. `None` means the working directory for a
    /// local session and the predefined sandbox for a remote one.
    pub fn sandbox_set(
        &self,
        name: Option<&str>,
        copy_samples: bool,
        reinitialize: bool,
    ) -> CyResult<SandboxIdentity> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let target = match (name, self.connectivity_mode()?) {
            (_, ConnectivityMode::Unknown) => return Err(CyError::ModeUndetermined),
            (Some(n), _) => Some(n.to_string()),
            (None, ConnectivityMode::Remote) => Some(PREDEFINED_SANDBOX_NAME.to_string()),
            (None, ConnectivityMode::Local) => None,
        };
        let identity = match target {
            Some(n) => self.provision_sandbox(&SandboxOptions {
                sandbox_name: Some(n),
                copy_samples,
                reinitialize,
            })?,
            None => SandboxIdentity::default(),
        };
        self.sandbox.install(identity)
    }

    /// Remove a sandbox, the current one when `name` is `None`.
    ///
    /// Removing the current sandbox falls back to the default: re-created on
    /// the next dispatch if the default itself was removed, otherwise
    /// selected again without copying samples. With no recorded default a
    /// remote session falls back to the predefined sandbox and a local one
    /// to the working directory.
    pub fn sandbox_remove(&self, name: Option<&str>) -> CyResult<Value> {
        let current = self.ensure_sandbox()?;
        let target = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| current.name.clone())
            .ok_or(CyError::NoSandbox)?;
        let result = self.command_post(
            &format!("filetransfer removeSandbox sandboxName=\"{target}\""),
            "sandbox_remove",
        )?;

        if current.name.as_deref() == Some(target.as_str()) {
            // A remote session cannot fall back to the working directory.
            let default_name = match self.sandbox.get_default()?.and_then(|d| d.sandbox_name) {
                Some(name) => Some(name),
                None if self.connectivity_mode()? == ConnectivityMode::Remote => {
                    Some(PREDEFINED_SANDBOX_NAME.to_string())
                }
                None => None,
            };
            match default_name {
                Some(default_name) if default_name == target => {
                    self.sandbox.set_current(None, None)?;
                    self.sandbox.request_reinitialize()?;
                }
                Some(default_name) => {
                    let identity = self.provision_sandbox(&SandboxOptions {
                        sandbox_name: Some(default_name),
                        copy_samples: false,
                        reinitialize: false,
                    })?;
                    self.sandbox.install(identity)?;
                }
                None => {
                    self.sandbox.set_current(None, None)?;
                }
            }
        }
        Ok(result)
    }

    /// Fetch the browser half of the bridge and bind it to a fresh channel.
    ///
    /// Every call mints a new channel; calls still waiting on the previous
    /// one will never be answered.
    pub fn browser_client_js(&self) -> CyResult<String> {
        let url = &self.config.browser_client_url;
        let resp = self
            .direct
            .send(&HttpRequest::get(url.as_str()))
            .map(|resp| CyResponse::from_http(url.as_str(), resp))
            .map_err(|e| CyError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        resp.raise_for_status()?;
        let channel = self.channel.new_channel()?;
        Ok(format!(
            "var Channel = \"{channel}\";\n\nvar JupyterBridge = \"{}\";\n\n{}",
            self.config.bridge_root(),
            resp.text
        ))
    }

    /// Channel the browser client was last bound to.
    pub fn browser_client_channel(&self) -> CyResult<Option<Channel>> {
        self.channel.current_channel()
    }
}
