// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Error taxonomy shared by the relay core and the command facade.

use std::fmt;

use thiserror::Error;

/// Class of an HTTP failure status, used in `raise_for_status` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Client,
    Server,
}

impl HttpErrorKind {
    /// Classify a status code. Returns `None` for anything outside 400..600.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400..=499 => Some(Self::Client),
            500..=599 => Some(Self::Server),
            _ => None,
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("Client"),
            Self::Server => f.write_str("Server"),
        }
    }
}

/// Errors surfaced by [`crate::CyClient`] and the relay components.
#[derive(Debug, Error)]
pub enum CyError {
    /// The request could not be expressed as a relay envelope.
    #[error("cannot encode request for {url}: {reason}")]
    Encoding { url: String, reason: String },

    /// The bridge refused or failed the queue/dequeue exchange.
    #[error("error exchanging with bridge at {url}: {reason}")]
    BridgeUnreachable { url: String, reason: String },

    /// The bridge accepted the request but nothing answered on the channel.
    #[error("could not contact url: {url}")]
    NoReceiver { url: String },

    /// Relayed bytes were not a reply envelope even after charset detection.
    #[error("undecipherable message received from bridge: {detail}")]
    RelayDecode { detail: String },

    /// Unrecognized or mistyped sandbox option.
    #[error("invalid key {key} in sandbox parameter list")]
    InvalidOption { key: String },

    /// Neither a local nor a relayed Cytoscape answered the probe.
    #[error("cannot find local or remote Cytoscape. Start Cytoscape and then proceed.")]
    ModeUndetermined,

    /// Cytoscape (directly or relayed) answered with a 4xx/5xx status.
    #[error("{status} {kind} Error: {reason} for url: {url}")]
    Http {
        status: u16,
        kind: HttpErrorKind,
        reason: String,
        url: String,
        body: String,
    },

    /// A direct HTTP call could not reach its endpoint.
    #[error("cannot reach {url}: {reason}")]
    Transport { url: String, reason: String },

    /// A response body was not the JSON the caller expected.
    #[error("malformed reply from {url}: {reason}")]
    Json { url: String, reason: String },

    /// CyREST reported an error message for an operation.
    #[error("In {operation}: {message}")]
    Cytoscape { operation: String, message: String },

    /// There is no sandbox to operate on (the working directory is in use).
    #[error("no current sandbox; the Cytoscape file system is in use")]
    NoSandbox,

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl CyError {
    /// True for failures that mean "nothing is listening" rather than a
    /// Cytoscape-side rejection.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::BridgeUnreachable { .. }
                | Self::NoReceiver { .. }
                | Self::Transport { .. }
                | Self::ModeUndetermined
        )
    }
}

pub type CyResult<T> = Result<T, CyError>;
