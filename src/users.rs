//! Users data source: one HTTP GET returning a JSON array of user objects.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users";

/// Why fetching users failed.
///
/// `Display` is the underlying message alone; it is shown to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport fault or non-success HTTP status.
    #[error("{0}")]
    Network(String),

    /// The body is not an array of user objects.
    #[error("{0}")]
    Decode(String),
}

/// A user's identifier as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One user. Only `id` and `name` are required; every other field is kept
/// as-is, in the order received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserRecord {
    /// Field names in display order: `id`, `name`, then the rest as received.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        ["id", "name"]
            .into_iter()
            .chain(self.fields.keys().map(String::as_str))
    }

    /// Plain-text value of a field, or `None` if the record lacks it.
    ///
    /// Nested objects and arrays are flattened to their scalar leaves joined
    /// by `", "`.
    #[must_use]
    pub fn field_text(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            other => self.fields.get(other).map(value_text),
        }
    }
}

fn value_text(value: &Value) -> String {
    let mut leaves = Vec::new();
    collect_leaves(value, &mut leaves);
    leaves.join(", ")
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push(s.clone()),
        Value::Bool(_) | Value::Number(_) => out.push(value.to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_leaves(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_leaves(item, out)),
    }
}

/// HTTP client for the users endpoint.
#[derive(Debug, Clone)]
pub struct UsersClient {
    http: reqwest::Client,
    endpoint: String,
}

impl UsersClient {
    /// Builds a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built (TLS
    /// backend initialisation).
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    /// Performs one GET against the endpoint.
    ///
    /// # Errors
    ///
    /// [`FetchError::Network`] on a transport fault or non-success status,
    /// [`FetchError::Decode`] if the body is not an array of user objects.
    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, FetchError> {
        info!(endpoint = %self.endpoint, "fetching users");

        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(error = %e, "users request failed");
                FetchError::Network(e.to_string())
            })?;

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "reading users response failed");
            FetchError::Network(e.to_string())
        })?;

        let users: Vec<UserRecord> = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "users response is malformed");
            FetchError::Decode(e.to_string())
        })?;

        debug!(count = users.len(), "users decoded");
        Ok(users)
    }
}
