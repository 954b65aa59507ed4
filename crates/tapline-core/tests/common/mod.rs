//! Shared test helpers for tapline-core integration tests.
//!
//! This module provides scripted in-memory sessions for the interaction
//! tests and a minimal HTTP/1.1 mock WebDriver endpoint for the backend
//! tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use tapline_core::actor::Actor;
use tapline_core::geometry::{BoundingBox, Dimension};
use tapline_core::mock::{MockElement, MockSession};
use tapline_core::target::{Locator, Target};

// ---------------------------------------------------------------------------
// In-memory session helpers
// ---------------------------------------------------------------------------

pub const FULL_HD: Dimension = Dimension::new(1080, 1920);

/// A target located by accessibility id `id`.
pub fn target(name: &str, id: &str) -> Target {
    Target::the(name).located_by(Locator::accessibility_id(id))
}

/// An empty 1080x1920 session.
pub fn full_hd() -> MockSession {
    MockSession::new(FULL_HD)
}

/// Adds `element` behind `target` and returns the session for chaining.
pub fn with(session: MockSession, target: &Target, element: MockElement) -> MockSession {
    session.with_element(target.locator().clone(), element)
}

/// A plain element in the middle of the screen.
pub fn button() -> MockElement {
    MockElement::at(BoundingBox::new(440, 900, 200, 120))
}

/// An actor over a clone of `session`, so the test keeps an inspection handle.
pub fn actor_on(session: &MockSession) -> Actor {
    Actor::named("tester", session.clone())
}

// ---------------------------------------------------------------------------
// Mock WebDriver endpoint
// ---------------------------------------------------------------------------

/// A request the mock endpoint received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

/// A canned reply: the first route whose method matches and whose path ends
/// with `path_suffix` answers the request.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path_suffix: String,
    pub status: u16,
    pub body: Value,
}

impl Route {
    pub fn new(method: &'static str, path_suffix: &str, status: u16, body: Value) -> Self {
        Self {
            method,
            path_suffix: path_suffix.to_string(),
            status,
            body,
        }
    }

    /// A 200 reply wrapping `value` the way W3C endpoints do.
    pub fn ok(method: &'static str, path_suffix: &str, value: Value) -> Self {
        Self::new(method, path_suffix, 200, serde_json::json!({ "value": value }))
    }

    /// A W3C error reply.
    pub fn error(method: &'static str, path_suffix: &str, status: u16, error: &str) -> Self {
        Self::new(
            method,
            path_suffix,
            status,
            serde_json::json!({ "value": { "error": error, "message": format!("mock: {error}"), "stacktrace": "" } }),
        )
    }
}

pub type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

/// Start a mock WebDriver endpoint that serves `routes` on every connection
/// until the test ends. Returns the base URL and the request log.
pub async fn mock_webdriver(routes: Vec<Route>) -> (String, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let server_log = log.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            let log = server_log.clone();
            tokio::spawn(async move {
                serve_connection(stream, &routes, &log).await;
            });
        }
    });

    (format!("http://{addr}"), log)
}

async fn serve_connection(stream: TcpStream, routes: &[Route], log: &RequestLog) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        // Request line.
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
        }
        let mut parts = line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        // Headers.
        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        // Body.
        let mut body = vec![0u8; content_length];
        if content_length > 0 && reader.read_exact(&mut body).await.is_err() {
            return;
        }
        let body = serde_json::from_slice::<Value>(&body).ok();

        log.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            body,
        });

        let (status, payload) = routes
            .iter()
            .find(|r| r.method == method && path.ends_with(&r.path_suffix))
            .map(|r| (r.status, r.body.to_string()))
            .unwrap_or_else(|| {
                (
                    404,
                    serde_json::json!({ "value": { "error": "unknown command", "message": path } })
                        .to_string(),
                )
            });

        let response = format!(
            "HTTP/1.1 {status} MOCK\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\n\r\n{payload}",
            payload.len()
        );
        if write_half.write_all(response.as_bytes()).await.is_err() {
            return;
        }
        let _ = write_half.flush().await;
    }
}

/// Requests recorded so far, oldest first.
pub fn requests(log: &RequestLog) -> Vec<RecordedRequest> {
    log.lock().unwrap().clone()
}
