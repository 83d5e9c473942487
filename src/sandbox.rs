// CLASSIFICATION: COMMUNITY
// Filename: sandbox.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Sandbox session state.
//!
//! A sandbox is a named directory under Cytoscape's `filetransfer` area that
//! stands in for the workstation file system when the client cannot share
//! it. With no sandbox, file names refer to the working directory.
//!
//! The default sandbox is chosen lazily on the first dispatch, once the
//! connectivity mode is known: remote sessions get [`PREDEFINED_SANDBOX_NAME`],
//! local sessions get none.

use std::sync::Mutex;

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CyError, CyResult};
use crate::mode::ConnectivityMode;

pub const PREDEFINED_SANDBOX_NAME: &str = "default_sandbox";

const KEY_SANDBOX_NAME: &str = "sandboxName";
const KEY_COPY_SAMPLES: &str = "copySamples";
const KEY_REINITIALIZE: &str = "reinitialize";

/// Options used when creating a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxOptions {
    pub sandbox_name: Option<String>,
    /// Copy Cytoscape's sample data into the sandbox.
    pub copy_samples: bool,
    /// Wipe the sandbox if it already exists.
    pub reinitialize: bool,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            sandbox_name: None,
            copy_samples: true,
            reinitialize: true,
        }
    }
}

impl SandboxOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            sandbox_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Build options from a key/value map, starting from the defaults.
    /// Only `sandboxName`, `copySamples` and `reinitialize` are accepted.
    pub fn from_map(map: &Map<String, Value>) -> CyResult<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            let invalid = || CyError::InvalidOption { key: key.clone() };
            match key.as_str() {
                KEY_SANDBOX_NAME => {
                    options.sandbox_name = match value {
                        Value::Null => None,
                        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                        _ => return Err(invalid()),
                    }
                }
                KEY_COPY_SAMPLES => options.copy_samples = value.as_bool().ok_or_else(invalid)?,
                KEY_REINITIALIZE => options.reinitialize = value.as_bool().ok_or_else(invalid)?,
                _ => return Err(invalid()),
            }
        }
        Ok(options)
    }
}

/// Name and workstation path of the current sandbox. Both empty means the
/// working directory is used directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxIdentity {
    pub name: Option<String>,
    pub path: Option<String>,
}

impl SandboxIdentity {
    pub fn new(name: Option<String>, path: Option<String>) -> Self {
        Self { name, path }
    }

    pub fn is_sandboxed(&self) -> bool {
        self.name.is_some()
    }
}

#[derive(Debug, Default)]
struct Inner {
    default: Option<SandboxOptions>,
    current: SandboxIdentity,
    initialized: bool,
}

/// Mutex-guarded sandbox record owned by a client context.
#[derive(Debug, Default)]
pub struct SandboxState {
    inner: Mutex<Inner>,
}

impl SandboxState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CyResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CyError::LockPoisoned("sandbox state"))
    }

    pub fn get_default(&self) -> CyResult<Option<SandboxOptions>> {
        Ok(self.lock()?.default.clone())
    }

    /// Validate and install new default options, returning the previous
    /// default. On error the previous default is kept. A new default is
    /// applied at the next dispatch.
    pub fn set_default(&self, options: &Map<String, Value>) -> CyResult<Option<SandboxOptions>> {
        let parsed = SandboxOptions::from_map(options)?;
        self.set_default_options(parsed)
    }

    pub fn set_default_options(&self, options: SandboxOptions) -> CyResult<Option<SandboxOptions>> {
        let mut inner = self.lock()?;
        let previous = inner.default.replace(options);
        inner.initialized = false;
        Ok(previous)
    }

    pub fn get_current(&self) -> CyResult<SandboxIdentity> {
        Ok(self.lock()?.current.clone())
    }

    pub fn set_current(&self, name: Option<String>, path: Option<String>) -> CyResult<SandboxIdentity> {
        let mut inner = self.lock()?;
        inner.current = SandboxIdentity::new(name, path);
        info!("current sandbox set to {:?}", inner.current);
        Ok(inner.current.clone())
    }

    /// Make `identity` current and mark initialization done, so an explicit
    /// choice is not replaced by the default on the next dispatch.
    pub fn install(&self, identity: SandboxIdentity) -> CyResult<SandboxIdentity> {
        let mut inner = self.lock()?;
        inner.current = identity;
        inner.initialized = true;
        info!("sandbox installed: {:?}", inner.current);
        Ok(inner.current.clone())
    }

    pub fn is_initialized(&self) -> CyResult<bool> {
        Ok(self.lock()?.initialized)
    }

    /// Make the next [`ensure_initialized`](Self::ensure_initialized) run again.
    pub fn request_reinitialize(&self) -> CyResult<()> {
        self.lock()?.initialized = false;
        Ok(())
    }

    /// Initialize the sandbox once for the resolved `mode`.
    ///
    /// When the effective default names a sandbox, `provision` performs the
    /// creation handshake and returns the identity it produced. The lock is
    /// held throughout, so concurrent callers provision at most once.
    pub fn ensure_initialized<F>(&self, mode: ConnectivityMode, provision: F) -> CyResult<SandboxIdentity>
    where
        F: FnOnce(&SandboxOptions) -> CyResult<SandboxIdentity>,
    {
        let mut inner = self.lock()?;
        if inner.initialized {
            return Ok(inner.current.clone());
        }
        let options = match (&inner.default, mode) {
            (_, ConnectivityMode::Unknown) => return Err(CyError::ModeUndetermined),
            (Some(options), _) => options.clone(),
            (None, ConnectivityMode::Remote) => SandboxOptions::named(PREDEFINED_SANDBOX_NAME),
            (None, ConnectivityMode::Local) => SandboxOptions::default(),
        };
        // A local session with no explicit default keeps the default empty.
        let current = if options.sandbox_name.is_some() {
            if inner.default.is_none() {
                inner.default = Some(options.clone());
            }
            provision(&options)?
        } else {
            SandboxIdentity::default()
        };
        inner.current = current;
        inner.initialized = true;
        info!("sandbox initialized for {mode:?}: {:?}", inner.current);
        Ok(inner.current.clone())
    }

    /// Forget everything: no default, no current sandbox, not initialized.
    pub fn reset(&self) -> CyResult<()> {
        *self.lock()? = Inner::default();
        Ok(())
    }
}
