// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Client configuration: Cytoscape base URL, bridge URL and probe timing.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// CyREST base URL of a Cytoscape instance on the local workstation.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234/v1";
/// Public Jupyter-bridge deployment.
pub const DEFAULT_BRIDGE_URL: &str = "https://jupyter-bridge.cytoscape.org";
/// Environment variable overriding the bridge URL.
pub const BRIDGE_URL_ENV: &str = "JUPYTER_BRIDGE_URL";
/// Browser-side half of the bridge, served as a plain script.
pub const DEFAULT_BROWSER_CLIENT_URL: &str =
    "https://raw.githubusercontent.com/cytoscape/jupyter-bridge/master/client/javascript_bridge.js";

/// Runtime configuration for a [`crate::CyClient`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// CyREST base URL used for direct calls and mode probing.
    pub base_url: String,
    /// Bridge base URL used when Cytoscape is only reachable remotely.
    pub bridge_url: String,
    /// Timeout for the direct probe of `base_url`, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Whether the process is hosted by a notebook kernel.
    pub notebook: bool,
    /// Location of the browser client script.
    pub browser_client_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            bridge_url: DEFAULT_BRIDGE_URL.into(),
            probe_timeout_ms: 2_000,
            notebook: false,
            browser_client_url: DEFAULT_BROWSER_CLIENT_URL.into(),
        }
    }
}

/// Errors produced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ClientConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_toml_str(&data)?.with_env_overrides())
    }

    /// Apply `JUPYTER_BRIDGE_URL` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BRIDGE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.bridge_url = url.to_string();
            }
        }
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Bridge URL without a trailing slash.
    pub fn bridge_root(&self) -> &str {
        self.bridge_url.trim_end_matches('/')
    }

    /// Base URL without a trailing slash.
    pub fn base_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ClientConfig::from_toml_str("notebook = true\nprobe_timeout_ms = 250\n").unwrap();
        assert!(cfg.notebook);
        assert_eq!(cfg.probe_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.bridge_url, DEFAULT_BRIDGE_URL);
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        assert!(matches!(
            ClientConfig::from_toml_str("notebook = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn roots_drop_trailing_slash() {
        let cfg = ClientConfig {
            base_url: "http://localhost:1234/v1/".into(),
            bridge_url: "http://bridge:9529/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(cfg.base_root(), "http://localhost:1234/v1");
        assert_eq!(cfg.bridge_root(), "http://bridge:9529");
    }
}
