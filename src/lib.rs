// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v2.0
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Remote command relay for Cytoscape.
//!
//! Requests for Cytoscape's CyREST API go straight to the workstation when
//! Cytoscape is reachable, and otherwise through a Jupyter-bridge relay that
//! a browser page on the workstation drains and answers.

/// Shared error type.
pub mod error;

/// Client configuration.
pub mod config;

/// Blocking HTTP seam.
pub mod transport;

/// Bridge channel identity.
pub mod channel;

/// Relay envelope codec.
pub mod envelope;

/// Bridge queue/dequeue protocol.
pub mod relay;

/// Connectivity mode detection.
pub mod mode;

/// Sandbox session state.
pub mod sandbox;

/// Dispatch context.
pub mod client;

/// Commands API and CyREST verbs.
pub mod commands;

pub use channel::{Channel, ChannelSlot};
pub use client::CyClient;
pub use config::{ClientConfig, ConfigError};
pub use envelope::{CyResponse, ReplyEnvelope, RequestEnvelope};
pub use error::{CyError, CyResult};
pub use mode::ConnectivityMode;
pub use relay::RelayTransport;
pub use sandbox::{SandboxIdentity, SandboxOptions, SandboxState};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, UreqTransport};
