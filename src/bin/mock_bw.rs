//! Mock `bw serve` binary for integration testing
//!
//! Implements the handful of Vault Management API endpoints bwnote uses,
//! backed by a fixed in-memory vault that starts locked.
//!
//! Usage: `mock_bw serve --port <port> [--hostname <host>]`

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MASTER_PASSWORD: &str = "correct horse battery staple";
const LOGIN_ID: &str = "0f2a6b4e-1d3c-4e5f-8a9b-c0d1e2f3a4b5";
const NOTE_ID: &str = "9a8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d";
/// Requests for this item stall before answering
const SLOW_ID: &str = "slow";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) != Some("serve") {
        eprintln!("mock_bw: only 'serve' is supported");
        std::process::exit(2);
    }

    let mut port: u16 = 8087;
    let mut hostname = "localhost".to_string();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--port" => port = iter.next().and_then(|p| p.parse().ok()).unwrap_or(port),
            "--hostname" => hostname = iter.next().cloned().unwrap_or(hostname),
            other => {
                eprintln!("mock_bw: unknown argument {other}");
                std::process::exit(2);
            }
        }
    }

    let listener = TcpListener::bind((hostname.as_str(), port)).unwrap_or_else(|e| {
        eprintln!("mock_bw: cannot bind {hostname}:{port}: {e}");
        std::process::exit(1);
    });

    let state = Arc::new(Mutex::new(MockVault { locked: true }));

    for stream in listener.incoming() {
        let Ok(stream) = stream else { continue };
        let state = Arc::clone(&state);
        std::thread::spawn(move || handle_connection(stream, &state));
    }
}

struct MockVault {
    locked: bool,
}

struct HttpRequest {
    method: String,
    path: String,
    content_type: String,
    body: String,
}

fn read_request(stream: &TcpStream) -> Option<HttpRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut content_type = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "content-type" => content_type = value.trim().to_string(),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(HttpRequest {
        method,
        path,
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<MockVault>) {
    let Some(request) = read_request(&stream) else {
        return;
    };

    if request.path == format!("/object/item/{SLOW_ID}") {
        std::thread::sleep(Duration::from_secs(2));
    }

    let (status, headers, body) = route(&request, state);
    let reason = match status {
        200 => "OK",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Unknown",
    };

    let body = body.to_string();
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(&body);

    stream.write_all(response.as_bytes()).ok();
    stream.flush().ok();
}

fn route(request: &HttpRequest, state: &Mutex<MockVault>) -> (u16, Vec<(&'static str, String)>, Value) {
    let mut vault = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/status") => {
            let status = if vault.locked { "locked" } else { "unlocked" };
            (200, vec![], json!({
                "success": true,
                "data": {
                    "object": "template",
                    "template": {
                        "serverUrl": null,
                        "lastSync": "2024-05-01T12:00:00.000Z",
                        "userEmail": "user@example.com",
                        "userId": "00000000-0000-0000-0000-000000000001",
                        "status": status
                    }
                }
            }))
        }

        ("POST", "/unlock") => {
            if !request.content_type.starts_with("application/json") {
                return (400, vec![], json!({
                    "success": false,
                    "message": format!("Unsupported content type '{}'", request.content_type)
                }));
            }
            let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            if body["password"] == MASTER_PASSWORD {
                vault.locked = false;
                (200, vec![], json!({
                    "success": true,
                    "data": {
                        "noColor": false,
                        "object": "message",
                        "title": "Your vault is now unlocked!",
                        "message": null,
                        "raw": "bW9jay1zZXNzaW9uLWtleQ=="
                    }
                }))
            } else {
                (400, vec![], json!({ "success": false, "message": "Invalid master password." }))
            }
        }

        ("POST", "/lock") => {
            vault.locked = true;
            (200, vec![], json!({
                "success": true,
                "data": { "noColor": false, "object": "message", "title": "Your vault is locked.", "message": null }
            }))
        }

        ("GET", "/redirect") => (302, vec![("Location", "/status".to_string())], json!({})),

        ("GET", path) if path.starts_with("/object/item/") => {
            if vault.locked {
                return (400, vec![], json!({ "success": false, "message": "Vault is locked." }));
            }
            match &path["/object/item/".len()..] {
                LOGIN_ID | SLOW_ID => (200, vec![], json!({
                    "success": true,
                    "data": {
                        "object": "item",
                        "id": LOGIN_ID,
                        "type": 1,
                        "name": "GitHub",
                        "notes": "Recovery codes in the safe",
                        "login": {
                            "uris": [{ "match": null, "uri": "https://github.com/login" }],
                            "username": "octocat",
                            "password": "p@ss w0rd \"quoted\"",
                            "totp": null
                        }
                    }
                })),
                NOTE_ID => (200, vec![], json!({
                    "success": true,
                    "data": { "object": "item", "id": NOTE_ID, "type": 2, "name": "Wifi", "notes": "hunter2" }
                })),
                _ => (404, vec![], json!({ "success": false, "message": "Not found." })),
            }
        }

        _ => (404, vec![], json!({ "success": false, "message": "Not found." })),
    }
}
