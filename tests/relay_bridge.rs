// CLASSIFICATION: COMMUNITY
// Filename: relay_bridge.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::collections::VecDeque;
use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde_json::{json, Value};
use tiny_http::{Response, Server};

use cyrelay::{
    Channel, ClientConfig, CyClient, CyError, HttpRequest, HttpTransport, RelayTransport, UreqTransport,
};

/// In-process bridge: queues envelopes, answers `retries` dequeues with 408,
/// then replies with whatever `answer` makes of the oldest envelope.
struct FakeBridge {
    url: String,
    log: Arc<Mutex<Vec<String>>>,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl FakeBridge {
    fn start(retries: usize, queue_status: u16, answer: fn(&Value) -> Value) -> Option<Self> {
        if TcpListener::bind("127.0.0.1:0").is_err() {
            eprintln!("skipping test: cannot bind local port");
            return None;
        }
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let log = Arc::new(Mutex::new(Vec::new()));
        let srv = server.clone();
        let srv_log = log.clone();
        let handle = thread::spawn(move || {
            let mut pending: VecDeque<Value> = VecDeque::new();
            let mut polls = 0;
            for mut req in srv.incoming_requests() {
                let url = req.url().to_string();
                srv_log.lock().unwrap().push(format!("{} {}", req.method(), url));
                if url.starts_with("/queue_request") {
                    let mut body = String::new();
                    let _ = req.as_reader().read_to_string(&mut body);
                    pending.push_back(serde_json::from_str(&body).unwrap_or(Value::Null));
                    polls = 0;
                    let _ = req.respond(Response::empty(queue_status));
                } else if url.starts_with("/dequeue_reply") {
                    if polls < retries {
                        polls += 1;
                        let _ = req.respond(Response::empty(408));
                        continue;
                    }
                    let envelope = pending.pop_front().unwrap_or(Value::Null);
                    let _ = req.respond(Response::from_string(answer(&envelope).to_string()));
                } else {
                    let _ = req.respond(Response::empty(404));
                }
            }
        });
        Some(Self {
            url: format!("http://127.0.0.1:{port}"),
            log,
            server,
            handle: Some(handle),
        })
    }

    fn count(&self, needle: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| e.contains(needle)).count()
    }
}

impl Drop for FakeBridge {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn cytoscape_answer(envelope: &Value) -> Value {
    let url = envelope["url"].as_str().unwrap_or("");
    let text = if url.contains("setSandbox") {
        json!({"data": {"sandboxPath": "/home/cy/CytoscapeConfiguration/filetransfer/default_sandbox"}, "errors": []})
    } else {
        json!({"data": {"networks": [101]}, "errors": []})
    };
    json!({"status": 200, "reason": "OK", "text": text.to_string()})
}

fn nobody_answer(_: &Value) -> Value {
    json!({"status": 0, "reason": null, "text": null})
}

/// Port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn relay_over(bridge: &FakeBridge) -> RelayTransport {
    let http: Arc<dyn HttpTransport> = Arc::new(UreqTransport::new());
    RelayTransport::new(bridge.url.clone(), http)
}

#[test]
fn dequeue_retries_on_408_until_reply() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some(bridge) = FakeBridge::start(3, 200, cytoscape_answer) else {
        return;
    };
    let channel = Channel::generate();
    let resp = relay_over(&bridge)
        .request(&HttpRequest::get("http://127.0.0.1:1234/v1/networks"), channel)
        .unwrap();

    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.json().unwrap()["data"]["networks"], json!([101]));
    assert_eq!(bridge.count("POST /queue_request"), 1);
    assert_eq!(bridge.count("GET /dequeue_reply"), 4);
    assert_eq!(bridge.count(&format!("channel={channel}")), 5);
}

#[test]
fn status_zero_reply_means_no_browser() {
    let Some(bridge) = FakeBridge::start(0, 200, nobody_answer) else {
        return;
    };
    let err = relay_over(&bridge)
        .request(&HttpRequest::get("http://127.0.0.1:1234/v1"), Channel::generate())
        .unwrap_err();
    assert!(matches!(err, CyError::NoReceiver { .. }));
    assert!(err.to_string().contains("http://127.0.0.1:1234/v1"));
}

#[test]
fn queue_rejection_stops_before_dequeue() {
    let Some(bridge) = FakeBridge::start(0, 500, cytoscape_answer) else {
        return;
    };
    let err = relay_over(&bridge)
        .request(&HttpRequest::get("http://127.0.0.1:1234/v1"), Channel::generate())
        .unwrap_err();
    assert!(matches!(err, CyError::BridgeUnreachable { .. }));
    assert_eq!(bridge.count("/dequeue_reply"), 0);
}

#[test]
fn remote_session_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some(bridge) = FakeBridge::start(2, 200, cytoscape_answer) else {
        return;
    };
    let config = ClientConfig {
        base_url: format!("http://127.0.0.1:{}/v1", closed_port()),
        bridge_url: bridge.url.clone(),
        notebook: true,
        probe_timeout_ms: 500,
        ..ClientConfig::default()
    };
    let client = CyClient::new(config);

    let data = client.commands_post("network list").unwrap();
    assert_eq!(data["networks"], json!([101]));
    // probe, sandbox handshake, command
    assert_eq!(bridge.count("/queue_request"), 3);
    let sandbox = client.sandbox_state().get_current().unwrap();
    assert_eq!(sandbox.name.as_deref(), Some("default_sandbox"));

    client.commands_post("network list").unwrap();
    assert_eq!(bridge.count("/queue_request"), 4);
}

#[test]
fn unreachable_bridge_is_connectivity_error() {
    let relay = RelayTransport::new(
        format!("http://127.0.0.1:{}", closed_port()),
        Arc::new(UreqTransport::new()),
    );
    let err = relay
        .request(&HttpRequest::get("http://127.0.0.1:1234/v1"), Channel::generate())
        .unwrap_err();
    assert!(err.is_connectivity());
}
