//! The users application: one query, one table.

use std::io;
use std::sync::Arc;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::widgets::{Block, Borders};
use tracing::{debug, error};

use crate::application::Application;
use crate::command::{Action, Command};
use crate::subscription::Subscription;
use crate::subscription::query::{FetchState, Query, QueryClient, QueryError};
use crate::subscription::terminal::TerminalEvents;
use crate::users::{UserRecord, UsersClient};
use crate::view::Rendered;

/// Cache key of the users list.
pub const USERS_KEY: &str = "users";

#[derive(Debug)]
pub enum Message {
    Terminal(Event),
    TerminalError(io::Error),
    Users(FetchState<Vec<UserRecord>>),
}

/// Startup dependencies of [`UsersApp`].
#[derive(Debug, Clone)]
pub struct Flags {
    pub users: UsersClient,
    pub query_client: Arc<QueryClient>,
    /// Whether to listen to terminal input. Off in headless tests.
    pub terminal_input: bool,
}

pub struct UsersApp {
    users: UsersClient,
    query_client: Arc<QueryClient>,
    terminal_input: bool,
    state: FetchState<Vec<UserRecord>>,
}

impl UsersApp {
    /// The latest state delivered by the users query.
    #[must_use]
    pub const fn state(&self) -> &FetchState<Vec<UserRecord>> {
        &self.state
    }

    fn users_query(&self) -> Query<Vec<UserRecord>> {
        let users = self.users.clone();
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
            Arc::clone(&self.query_client),
        )
    }

    fn title(&self) -> &'static str {
        if self.state.is_stale() {
            " Users (refreshing) - q: quit "
        } else {
            " Users - q: quit "
        }
    }
}

impl Application for UsersApp {
    type Message = Message;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let app = Self {
            users: flags.users,
            query_client: flags.query_client,
            terminal_input: flags.terminal_input,
            state: FetchState::Pending,
        };
        (app, Command::none())
    }

    fn update(&mut self, msg: Message) -> Command<Message> {
        match msg {
            Message::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => Command::effect(Action::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Command::effect(Action::Quit)
                    }
                    _ => Command::none(),
                }
            }
            Message::Terminal(_) => Command::none(),
            Message::TerminalError(e) => {
                error!(error = %e, "terminal input failed");
                Command::effect(Action::Quit)
            }
            Message::Users(state) => {
                debug!(
                    pending = state.is_pending(),
                    error = state.is_error(),
                    rows = state.data().map_or(0, Vec::len),
                    "users state changed"
                );
                self.state = state;
                Command::none()
            }
        }
    }

    fn view(&self, frame: &mut Frame<'_>) {
        let block = Block::default().borders(Borders::ALL).title(self.title());
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());
        frame.render_widget(&Rendered::from_state(&self.state), inner);
    }

    fn subscriptions(&self) -> Vec<Subscription<Message>> {
        let mut subscriptions =
            vec![Subscription::new(self.users_query()).map(Message::Users)];

        if self.terminal_input {
            subscriptions.push(Subscription::new(TerminalEvents::new()).map(|result| {
                match result {
                    Ok(event) => Message::Terminal(event),
                    Err(e) => Message::TerminalError(e),
                }
            }));
        }
        subscriptions
    }
}
