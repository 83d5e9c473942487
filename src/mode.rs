// CLASSIFICATION: COMMUNITY
// Filename: mode.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Connectivity mode detection.
//!
//! `Unknown` moves to `Local` or `Remote` on the first successful probe and
//! never changes again. Failed probes leave it `Unknown` so a later call can
//! find a Cytoscape that was started in the meantime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::{info, warn};

use crate::error::{CyError, CyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityMode {
    #[default]
    Unknown,
    /// Cytoscape answers directly.
    Local,
    /// Cytoscape answers through the bridge.
    Remote,
}

impl ConnectivityMode {
    pub fn is_resolved(self) -> bool {
        self != Self::Unknown
    }
}

/// Memoizing probe state machine.
#[derive(Debug)]
pub struct ModeDetector {
    state: Mutex<ConnectivityMode>,
    notebook: AtomicBool,
}

impl ModeDetector {
    /// `notebook` says whether the process is hosted by a notebook kernel;
    /// only then is the relay considered at all.
    pub fn new(notebook: bool) -> Self {
        Self {
            state: Mutex::new(ConnectivityMode::Unknown),
            notebook: AtomicBool::new(notebook),
        }
    }

    pub fn notebook(&self) -> bool {
        self.notebook.load(Ordering::SeqCst)
    }

    /// Override the notebook-host flag, returning the previous value.
    pub fn set_notebook(&self, notebook: bool) -> bool {
        self.notebook.swap(notebook, Ordering::SeqCst)
    }

    /// Mode as currently recorded, without probing.
    pub fn current(&self) -> CyResult<ConnectivityMode> {
        Ok(*self
            .state
            .lock()
            .map_err(|_| CyError::LockPoisoned("connectivity mode"))?)
    }

    /// Resolve the mode, probing at most once locally and once remotely.
    ///
    /// The state lock is held across the probes so racing first calls
    /// perform a single transition.
    pub fn detect<L, R>(&self, probe_local: L, probe_remote: R) -> CyResult<ConnectivityMode>
    where
        L: FnOnce() -> bool,
        R: FnOnce() -> bool,
    {
        if !self.notebook() {
            return Ok(ConnectivityMode::Local);
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| CyError::LockPoisoned("connectivity mode"))?;
        if state.is_resolved() {
            return Ok(*state);
        }
        if probe_local() {
            *state = ConnectivityMode::Local;
        } else if probe_remote() {
            *state = ConnectivityMode::Remote;
        } else {
            warn!("neither local nor relayed Cytoscape answered; mode stays unknown");
            return Ok(ConnectivityMode::Unknown);
        }
        info!("connectivity mode resolved to {:?}", *state);
        Ok(*state)
    }
}
