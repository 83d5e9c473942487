// CLASSIFICATION: COMMUNITY
// Filename: relay.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Relay transport: one queue POST, then dequeue GETs until a reply arrives.
//!
//! The bridge long-polls each dequeue and answers `408` when nothing is
//! queued yet; the loop re-issues the GET immediately. There is no overall
//! deadline and no cancel message. A caller that gives up leaves the bridge
//! entry orphaned.

use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::channel::Channel;
use crate::envelope::{self, CyResponse, ReplyEnvelope, RequestEnvelope};
use crate::error::{CyError, CyResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Status the bridge uses for "no reply queued yet".
pub const STATUS_RETRY: u16 = 408;

/// Client half of the bridge protocol.
///
/// Replies on a channel are matched to requests by order, so calls through
/// one transport are serialized.
pub struct RelayTransport {
    bridge_url: String,
    http: Arc<dyn HttpTransport>,
    in_flight: Mutex<()>,
}

impl RelayTransport {
    pub fn new(bridge_url: impl Into<String>, http: Arc<dyn HttpTransport>) -> Self {
        let bridge_url = bridge_url.into().trim_end_matches('/').to_string();
        Self {
            bridge_url,
            http,
            in_flight: Mutex::new(()),
        }
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    /// Relay one envelope on `channel` and block until its reply arrives.
    pub fn relay(&self, envelope: &RequestEnvelope, channel: Channel) -> CyResult<ReplyEnvelope> {
        let queue_url = format!("{}/queue_request?channel={channel}", self.bridge_url);
        let body = serde_json::to_value(envelope).map_err(|e| CyError::Encoding {
            url: envelope.url.clone(),
            reason: e.to_string(),
        })?;
        let _turn = self
            .in_flight
            .lock()
            .map_err(|_| CyError::LockPoisoned("relay"))?;
        let queued = self.exchange(HttpRequest::post(&queue_url).with_json(body))?;
        if !queued.is_success() {
            return Err(bridge_failure(&queue_url, "error posting to bridge", &queued));
        }
        debug!("queued {} {} on channel {channel}", envelope.command, envelope.url);

        let dequeue_url = format!("{}/dequeue_reply?channel={channel}", self.bridge_url);
        let mut polls = 0usize;
        let reply = loop {
            polls += 1;
            let resp = self.exchange(HttpRequest::get(&dequeue_url))?;
            if resp.status != STATUS_RETRY {
                break resp;
            }
            debug!("no reply yet on channel {channel} after {polls} polls");
        };
        if !reply.is_success() {
            return Err(bridge_failure(&dequeue_url, "error receiving from bridge", &reply));
        }

        let envelope_reply = envelope::decode_reply(&reply.body)?;
        if !envelope_reply.has_receiver() {
            info!("bridge has no receiver for channel {channel}");
            return Err(CyError::NoReceiver {
                url: envelope.url.clone(),
            });
        }
        debug!(
            "relayed reply {}[{}] after {polls} polls",
            envelope_reply.reason, envelope_reply.status
        );
        Ok(envelope_reply)
    }

    /// Encode, relay and rebuild a response for `request`.
    pub fn request(&self, request: &HttpRequest, channel: Channel) -> CyResult<CyResponse> {
        let envelope = envelope::encode(request)?;
        let reply = self.relay(&envelope, channel)?;
        Ok(reply.into_response(request.url.clone()))
    }

    fn exchange(&self, request: HttpRequest) -> CyResult<HttpResponse> {
        self.http
            .send(&request)
            .map_err(|e| CyError::BridgeUnreachable {
                url: request.url.clone(),
                reason: e.to_string(),
            })
    }
}

fn bridge_failure(url: &str, what: &str, resp: &HttpResponse) -> CyError {
    CyError::BridgeUnreachable {
        url: url.to_string(),
        reason: format!("{what}: {} {} {}", resp.status, resp.reason, resp.text_lossy()),
    }
}
