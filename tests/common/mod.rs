#![allow(dead_code)]

use std::net::TcpListener;
use std::time::Duration;

use ratatui::{Terminal, backend::TestBackend};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERS_PATH: &str = "/users";

/// Starts a server answering `GET /users` with `response`.
pub async fn users_server(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

pub fn json_response(body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn delayed_json_response(body: &Value, delay: Duration) -> ResponseTemplate {
    json_response(body).set_delay(delay)
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{USERS_PATH}", server.uri())
}

/// Screen contents, one string per line.
/// A URL on a local port nobody listens on.
///
/// Dropping a `MockServer` hands it back to wiremock's pool rather than
/// closing it, so refused connections need a listener of our own.
pub fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{USERS_PATH}")
}

pub fn screen(terminal: &Terminal<TestBackend>) -> Vec<String> {
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect()
        })
        .collect()
}
