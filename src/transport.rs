// CLASSIFICATION: COMMUNITY
// Filename: transport.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Blocking HTTP transport used for direct CyREST calls and bridge traffic.

use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

use log::{debug, log_enabled, Level};
use serde_json::Value;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

pub type Params = BTreeMap<String, String>;
pub type Headers = BTreeMap<String, String>;

/// One outgoing HTTP call, before it is sent directly or relayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub params: Option<Params>,
    /// JSON body.
    pub json: Option<Value>,
    /// Raw body bytes.
    pub data: Option<Vec<u8>>,
    pub headers: Option<Headers>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn with_params(mut self, params: Option<Params>) -> Self {
        self.params = params;
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers
            .as_ref()
            .map(|h| h.keys().any(|k| k.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }
}

/// Status line and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an HTTP exchange at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },
    #[error("failed reading reply from {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Seam between the relay core and the network.
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange. Non-2xx statuses are returned as responses,
    /// only connection-level failures are errors.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_agent(
            AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .build(),
        )
    }

    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        log_http_request(request);
        let mut req = self.agent.request(&request.method, &request.url);
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }
        if let Some(params) = &request.params {
            for (k, v) in params {
                req = req.query(k, v);
            }
        }
        if let Some(headers) = &request.headers {
            for (k, v) in headers {
                req = req.set(k, v);
            }
        }
        let result = match (&request.json, &request.data) {
            (Some(json), _) => {
                if !request.has_header("Content-Type") {
                    req = req.set("Content-Type", "application/json");
                }
                req.send_string(&json.to_string())
            }
            (None, Some(data)) => req.send_bytes(data),
            (None, None) => req.call(),
        };
        let resp = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => {
                return Err(TransportError::Connect {
                    url: request.url.clone(),
                    reason: t.to_string(),
                })
            }
        };
        let status = resp.status();
        let reason = resp.status_text().to_string();
        let mut body = Vec::new();
        resp.into_reader()
            .read_to_end(&mut body)
            .map_err(|source| TransportError::Io {
                url: request.url.clone(),
                source,
            })?;
        let response = HttpResponse { status, reason, body };
        log_http_result(&response);
        Ok(response)
    }
}

/// Trace an outgoing request at debug level.
pub fn log_http_request(request: &HttpRequest) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    let mut line = format!("HTTP {}({})", request.method, request.url);
    if let Some(params) = &request.params {
        line.push_str(&format!(", params: {params:?}"));
    }
    if let Some(json) = &request.json {
        line.push_str(&format!(", json: {json}"));
    }
    if let Some(data) = &request.data {
        line.push_str(&format!(", data: {}", String::from_utf8_lossy(data)));
    }
    debug!("{line}");
}

/// Trace a completed exchange at debug level.
pub fn log_http_result(response: &HttpResponse) {
    debug!(
        "{}[{}], {} bytes",
        response.reason,
        response.status,
        response.body.len()
    );
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for unit tests.

    use super::*;
    use std::sync::Mutex;

    type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

    /// Records every request and answers through a closure.
    pub struct RecordingTransport {
        handler: Box<Handler>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        pub fn new<F>(handler: F) -> Self
        where
            F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Transport whose every call is refused.
        pub fn refusing() -> Self {
            Self::new(|req| {
                Err(TransportError::Connect {
                    url: req.url.clone(),
                    reason: "connection refused".into(),
                })
            })
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        pub fn count_matching(&self, needle: &str) -> usize {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.url.contains(needle))
                .count()
        }
    }

    impl HttpTransport for RecordingTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            (self.handler)(request)
        }
    }
}
