//! Subscriptions: long-lived event sources owned by the runtime.
//!
//! A [`Subscription`] wraps any [`SubscriptionSource`] together with a stable
//! [`SubscriptionId`]. Every time the application model changes the runtime
//! asks for the current list of subscriptions and hands it to the
//! [`SubscriptionManager`], which starts sources it has not seen, keeps the
//! ones that are still requested, and cancels the rest.

pub mod query;
pub mod terminal;

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::command::Action;

/// Identity of a subscription, used to diff subscription lists between updates.
///
/// Two sources with the same concrete type and the same hash are the same
/// subscription and will not be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    type_id: TypeId,
    hash: u64,
}

impl SubscriptionId {
    /// Creates an id scoped to the source type `T`.
    #[must_use]
    pub fn of<T: 'static>(hash: u64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            hash,
        }
    }
}

/// A source of messages that runs for as long as the application requests it.
pub trait SubscriptionSource: Send {
    /// The item type produced by the stream.
    type Output;

    /// Builds the stream. Called once when the subscription starts.
    fn stream(&self) -> BoxStream<'static, Self::Output>;

    /// Stable identity of this source.
    fn id(&self) -> SubscriptionId;
}

/// A type-erased subscription producing `Msg`.
///
/// # Example
///
/// ```rust
/// use usertable::subscription::{Subscription, terminal::TerminalEvents};
///
/// enum Message {
///     Input,
/// }
///
/// let sub: Subscription<Message> =
///     Subscription::new(TerminalEvents::new()).map(|_| Message::Input);
/// ```
pub struct Subscription<Msg> {
    pub(crate) id: SubscriptionId,
    pub(crate) spawn: Box<dyn FnOnce() -> BoxStream<'static, Msg> + Send>,
}

impl<Msg: Send + 'static> Subscription<Msg> {
    /// Wraps a source.
    pub fn new(source: impl SubscriptionSource<Output = Msg> + 'static) -> Self {
        let id = source.id();
        Self {
            id,
            spawn: Box::new(move || source.stream()),
        }
    }

    /// Transforms every item of the subscription. The id is unchanged.
    #[must_use]
    pub fn map<F, T>(self, f: F) -> Subscription<T>
    where
        F: Fn(Msg) -> T + Send + 'static,
        T: Send + 'static,
    {
        let spawn = self.spawn;
        Subscription {
            id: self.id,
            spawn: Box::new(move || spawn().map(f).boxed()),
        }
    }

    /// Returns the identity of the subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Handle for a running subscription task.
struct Handle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl Handle {
    /// Cancel the subscription and wait for the task to finish.
    async fn cancel(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}

/// Starts and stops subscription tasks as the requested set changes.
pub struct SubscriptionManager<Msg> {
    running: HashMap<SubscriptionId, Handle>,
    tx: mpsc::UnboundedSender<Action<Msg>>,
}

impl<Msg: Send + 'static> SubscriptionManager<Msg> {
    /// Creates a manager that forwards every item as [`Action::Message`] to `tx`.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Action<Msg>>) -> Self {
        Self {
            running: HashMap::new(),
            tx,
        }
    }

    /// Reconciles running tasks with `subscriptions`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn update(&mut self, subscriptions: Vec<Subscription<Msg>>) {
        let requested: HashSet<SubscriptionId> = subscriptions.iter().map(|s| s.id).collect();

        self.running.retain(|id, handle| {
            let keep = requested.contains(id);
            if !keep {
                debug!(?id, "cancelling subscription");
                handle.token.cancel();
            }
            keep
        });

        for subscription in subscriptions {
            if self.running.contains_key(&subscription.id) {
                continue;
            }
            debug!(id = ?subscription.id, "starting subscription");
            let (id, handle) = self.spawn(subscription);
            self.running.insert(id, handle);
        }
    }

    fn spawn(&self, subscription: Subscription<Msg>) -> (SubscriptionId, Handle) {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();
        let mut stream = (subscription.spawn)();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    item = stream.next() => match item {
                        Some(msg) => {
                            if tx.send(Action::Message(msg)).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        (subscription.id, Handle { token, join })
    }

    /// Number of subscriptions currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.running.len()
    }

    /// Returns `true` if no subscription is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Cancels every subscription and waits for their tasks.
    pub async fn shutdown(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.cancel().await;
        }
    }
}
