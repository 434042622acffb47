//! # usertable
//!
//! A terminal user directory. It fetches a list of users from a REST endpoint
//! and renders them in a table, with loading, error and empty states driven by
//! a keyed, deduplicating query cache.
//!
//! ## Architecture
//!
//! The application follows the Elm Architecture on top of
//! [ratatui](https://ratatui.rs/):
//!
//! 1. **Model**: [`UsersApp`](app::UsersApp) holds the latest
//!    [`FetchState`](subscription::query::FetchState) of the users list
//! 2. **Message**: query state changes and terminal input
//! 3. **Update**: stores the new state or quits
//! 4. **View**: [`Rendered`](view::Rendered), a pure function of the state
//! 5. **Subscriptions**: the users [`Query`](subscription::query::Query) and
//!    terminal events
//! 6. **Commands**: asynchronous side effects producing messages
//!
//! ## Layers
//!
//! - [`users`]: HTTP client decoding the endpoint's JSON into
//!   [`UserRecord`](users::UserRecord)s, with typed failures
//! - [`subscription::query`]: cache and in-flight deduplication per key
//! - [`view`]: the four render branches (loading, error, empty, table)
//! - [`application`], [`command`], [`subscription`], [`runtime`]: the event loop
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use usertable::app::{Flags, UsersApp};
//! use usertable::runtime::Runtime;
//! use usertable::subscription::query::QueryClient;
//! use usertable::users::{DEFAULT_ENDPOINT, UsersClient};
//!
//! # async fn run() -> color_eyre::Result<()> {
//! let flags = Flags {
//!     users: UsersClient::new(DEFAULT_ENDPOINT, None)?,
//!     query_client: Arc::new(QueryClient::new()),
//!     terminal_input: true,
//! };
//!
//! let mut terminal = ratatui::init();
//! let result = Runtime::<UsersApp>::new(flags, 30).run(&mut terminal).await;
//! ratatui::restore();
//! result
//! # }
//! ```

pub mod app;
pub mod application;
pub mod command;
pub mod config;
pub mod prelude;
pub mod runtime;
pub mod subscription;
pub mod telemetry;
pub mod users;
pub mod view;
