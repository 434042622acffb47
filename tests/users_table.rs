// The users app end to end: mock endpoint -> query -> table on a test terminal.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use ratatui::{Terminal, backend::TestBackend};
use serde_json::{Value, json};
use tokio::time::timeout;
use usertable::app::{Flags, USERS_KEY, UsersApp};
use usertable::prelude::*;
use usertable::subscription::SubscriptionSource;
use usertable::users::{UserRecord, UsersClient};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{
    delayed_json_response, endpoint, json_response, screen, unreachable_endpoint, users_server,
};

fn flags(url: String, query_client: &Arc<QueryClient>) -> Flags {
    Flags {
        users: UsersClient::new(url, None).unwrap(),
        query_client: Arc::clone(query_client),
        terminal_input: false,
    }
}

/// Runs the app for `run_for` and returns the last drawn screen.
async fn run_app(url: String, run_for: Duration) -> Vec<String> {
    let query_client = Arc::new(QueryClient::new());
    let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
    let runtime = Runtime::<UsersApp>::new(flags(url, &query_client), 60);

    // The app only quits on key presses; let it settle and stop it.
    let result = timeout(run_for, runtime.run(&mut terminal)).await;
    assert!(result.is_err(), "app should still be running");

    screen(&terminal)
}

fn alice_and_bob() -> Value {
    json!([
        {"id": 1, "name": "Alice"},
        {"id": 2, "name": "Bob"},
    ])
}

#[tokio::test]
async fn test_success_renders_one_row_per_record() {
    let server = users_server(json_response(&alice_and_bob())).await;

    let lines = run_app(endpoint(&server), Duration::from_millis(500)).await;

    // Border, header, two rows.
    assert!(lines[1].contains("id") && lines[1].contains("name"), "{lines:#?}");
    assert!(lines[2].contains('1') && lines[2].contains("Alice"), "{lines:#?}");
    assert!(lines[3].contains('2') && lines[3].contains("Bob"), "{lines:#?}");
    assert!(!lines[4].contains("Alice") && !lines[4].contains("Bob"));
}

#[tokio::test]
async fn test_empty_response_renders_empty_state() {
    let server = users_server(json_response(&json!([]))).await;

    let lines = run_app(endpoint(&server), Duration::from_millis(500)).await;

    assert!(lines[1].contains("No available data to display"), "{lines:#?}");
}

/// The text inside the border with wrapping undone: whitespace and the
/// vertical border glyphs dropped.
fn inner_text(lines: &[String]) -> String {
    squashed(&lines[1..lines.len() - 1].concat())
}

fn squashed(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '│')
        .collect()
}

/// The message the client itself reports for `url`.
async fn fetch_error_text(url: &str) -> String {
    let client = UsersClient::new(url, None).unwrap();
    client.fetch_users().await.unwrap_err().to_string()
}

#[tokio::test]
async fn test_server_failure_renders_full_error_message() {
    let server = users_server(ResponseTemplate::new(500)).await;
    let url = endpoint(&server);
    let message = fetch_error_text(&url).await;
    assert!(message.contains("500"), "{message}");

    let lines = run_app(url, Duration::from_millis(500)).await;

    assert!(lines[1].contains("An error has occurred: "), "{lines:#?}");
    assert_eq!(
        inner_text(&lines),
        squashed(&format!("An error has occurred: {message}")),
        "{lines:#?}"
    );
}

#[tokio::test]
async fn test_unreachable_endpoint_renders_full_error_message() {
    let url = unreachable_endpoint();
    let message = fetch_error_text(&url).await;
    assert!(message.contains("error sending request"), "{message}");

    let lines = run_app(url, Duration::from_millis(500)).await;

    assert_eq!(
        inner_text(&lines),
        squashed(&format!("An error has occurred: {message}")),
        "{lines:#?}"
    );
    assert!(lines.iter().all(|line| !line.contains("Loading...")));
}

#[tokio::test]
async fn test_in_flight_request_renders_loading() {
    let server = users_server(delayed_json_response(
        &alice_and_bob(),
        Duration::from_secs(5),
    ))
    .await;

    let lines = run_app(endpoint(&server), Duration::from_millis(200)).await;

    assert!(lines[1].contains("Loading..."), "{lines:#?}");
}

#[tokio::test]
async fn test_simultaneous_subscribers_issue_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(delayed_json_response(
            &alice_and_bob(),
            Duration::from_millis(100),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let query_client = Arc::new(QueryClient::new());
    let users = UsersClient::new(endpoint(&server), None).unwrap();
    let query = || {
        let users = users.clone();
        Query::new(
            &USERS_KEY,
            move || {
                let users = users.clone();
                Box::pin(async move {
                    users
                        .fetch_users()
                        .await
                        .map_err(|e| QueryError::new(e.to_string()))
                })
            },
            Arc::clone(&query_client),
        )
    };

    let (first, second): (Vec<FetchState<Vec<UserRecord>>>, Vec<_>) =
        futures::join!(query().stream().collect(), query().stream().collect());

    assert_eq!(first, second);
    assert_eq!(first.first(), Some(&FetchState::Pending));
    assert_eq!(first.last().and_then(FetchState::data).map(Vec::len), Some(2));

    server.verify().await;
}

#[tokio::test]
async fn test_unchanged_state_renders_identically() {
    let server = users_server(json_response(&alice_and_bob())).await;

    let first = run_app(endpoint(&server), Duration::from_millis(300)).await;
    let second = run_app(endpoint(&server), Duration::from_millis(300)).await;

    assert_eq!(first, second);
}
