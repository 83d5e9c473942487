// CLASSIFICATION: COMMUNITY
// Filename: direct_cytoscape.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;
use tiny_http::{Header, Response, Server};

use cyrelay::{ClientConfig, CyClient, CyError};

/// Serve `count` requests with canned CyREST answers, logging each one.
fn fake_cytoscape(count: usize) -> Option<(String, Arc<Mutex<Vec<String>>>, thread::JoinHandle<()>)> {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping test: cannot bind local port");
        return None;
    }
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let logs = Arc::new(Mutex::new(Vec::new()));
    let srv_logs = logs.clone();
    let handle = thread::spawn(move || {
        for _ in 0..count {
            let Ok(req) = server.recv() else { break };
            let url = req.url().to_string();
            srv_logs.lock().unwrap().push(format!("{} {}", req.method(), url));
            let resp = if url.starts_with("/v1/commands/view/list") {
                Response::from_string("Finished\n")
            } else if url.starts_with("/v1/commands/network") {
                Response::from_string("Network: 52\n  SUID: 52\nFinished\n")
            } else if url.starts_with("/v1/commands/bogus") {
                Response::from_string(
                    json!({"data": {}, "errors": [{"status": 404, "message": "No such command: bogus"}]}).to_string(),
                )
                .with_status_code(404)
            } else if url == "/v1/version" {
                Response::from_string(json!({"apiVersion": "v1", "cytoscapeVersion": "3.10.0"}).to_string())
                    .with_header(Header::from_bytes("Content-Type", "application/json").unwrap())
            } else {
                Response::from_string("").with_status_code(404)
            };
            let _ = req.respond(resp);
        }
    });
    Some((format!("http://127.0.0.1:{port}/v1"), logs, handle))
}

fn client_for(base_url: String) -> CyClient {
    CyClient::new(ClientConfig {
        base_url,
        notebook: false,
        ..ClientConfig::default()
    })
}

#[test]
fn commands_get_goes_straight_to_cytoscape() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some((base, logs, handle)) = fake_cytoscape(1) else {
        return;
    };
    let client = client_for(base);
    let lines = client.commands_get(r#"network get network="galFiltered.sif""#).unwrap();
    handle.join().unwrap();

    assert_eq!(lines, vec!["Network: 52", "SUID: 52"]);
    let l = logs.lock().unwrap();
    assert_eq!(l.len(), 1);
    assert!(l[0].starts_with("GET /v1/commands/network/get?"));
    assert!(l[0].contains("network=galFiltered.sif"));
}

#[test]
fn finished_only_output_is_empty() {
    let Some((base, _logs, handle)) = fake_cytoscape(1) else {
        return;
    };
    let lines = client_for(base).commands_run("view list").unwrap();
    handle.join().unwrap();
    assert!(lines.is_empty());
}

#[test]
fn cytoscape_error_message_is_surfaced() {
    let Some((base, _logs, handle)) = fake_cytoscape(1) else {
        return;
    };
    let err = client_for(base).commands_post("bogus thing").unwrap_err();
    handle.join().unwrap();
    match err {
        CyError::Cytoscape { operation, message } => {
            assert_eq!(operation, "commands_post");
            assert_eq!(message, "No such command: bogus");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn cyrest_get_parses_json() {
    let Some((base, _logs, handle)) = fake_cytoscape(1) else {
        return;
    };
    let version = client_for(base).cyrest_get("version", None).unwrap();
    handle.join().unwrap();
    assert_eq!(version["apiVersion"], "v1");
}

#[test]
fn unreachable_cytoscape_is_transport_error() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let err = client_for(format!("http://127.0.0.1:{port}/v1"))
        .cyrest_get("version", None)
        .unwrap_err();
    assert!(matches!(err, CyError::Transport { .. }));
    assert!(err.is_connectivity());
}
