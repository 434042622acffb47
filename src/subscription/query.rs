//! Keyed, deduplicated data fetching exposed as a subscription.
//!
//! A [`Query`] is a subscription whose stream reports the [`FetchState`] of one
//! cache key. The shared [`QueryClient`] owns the cache and the table of
//! in-flight requests, so any number of subscribers to the same key cause at
//! most one request at a time and all observe the same outcome.
//!
//! ```text
//!   subscriber A ──┐                 ┌─ cache[key] = CacheEntry
//!                  ├─ QueryClient ───┤
//!   subscriber B ──┘                 └─ in_flight[key] = InFlight { id, Shared<fetch> }
//! ```
//!
//! Requests run as their own tasks: a request whose subscribers are all gone
//! still completes and fills the cache.
//!
//! Per subscriber, the stream yields:
//!
//! - no cached value: `Pending`, then `Success` or `Error`;
//! - fresh cached value: `Success { is_stale: false }` and nothing else;
//! - stale cached value: `Success { is_stale: true }`, then the refetch outcome.
//!
//! Failures are never cached, so the next subscriber tries again.
//!
//! # Example
//!
//! ```rust,ignore
//! fn subscriptions(&self) -> Vec<Subscription<Message>> {
//!     vec![
//!         Subscription::new(Query::new(
//!             &"users",
//!             move || Box::pin(fetch_users()),
//!             self.query_client.clone(),
//!         ))
//!         .map(Message::Users),
//!     ]
//! }
//! ```

mod cache;
mod config;

use std::any::Any;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::subscription::{SubscriptionId, SubscriptionSource};

use cache::CacheEntry;
pub use config::{DEFAULT_CACHE_TIME, DEFAULT_STALE_TIME, QueryConfig};

/// Failure reported by a query fetcher.
///
/// `Clone` so one failed request can be handed to every waiting subscriber.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct QueryError(String);

impl QueryError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The observable outcome of a query for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState<T> {
    /// A request is running and there is nothing to show yet.
    Pending,
    /// The request succeeded.
    Success {
        data: T,
        /// Cached data shown while a refetch is running.
        is_stale: bool,
    },
    /// The request failed with this message.
    Error(String),
}

impl<T> FetchState<T> {
    /// Returns the data if the query succeeded.
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Success { is_stale: true, .. })
    }
}

type Fetcher<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync>;
type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, QueryError>>>;
type Slot = Box<dyn Any + Send + Sync>;

/// A registered request. `id` tells it apart from a later request for the
/// same key, e.g. one started after [`QueryClient::clear`].
struct InFlight {
    id: u64,
    fetch: Slot,
}

/// Owner of the query cache and of in-flight requests.
///
/// Create one at startup, share it behind an `Arc`, and drop it (or call
/// [`QueryClient::clear`]) on shutdown.
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use usertable::subscription::query::{QueryClient, QueryConfig};
///
/// let config = QueryConfig::new(Duration::from_secs(30), Duration::from_secs(300));
/// let client = Arc::new(QueryClient::with_config(config));
/// assert!(client.cached::<Vec<String>>("users").is_none());
/// ```
#[derive(Clone)]
pub struct QueryClient {
    cache: Arc<DashMap<String, Slot>>,
    in_flight: Arc<DashMap<String, InFlight>>,
    next_request: Arc<AtomicU64>,
    config: QueryConfig,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("config", &self.config)
            .finish()
    }
}

impl QueryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            next_request: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns the cached value for `key`, if any and not expired.
    pub fn cached<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        self.get_cache::<T>(key).map(|entry| entry.data)
    }

    /// Whether a request for `key` is currently running.
    #[must_use]
    pub fn is_fetching(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Drops every cached value and forgets in-flight requests.
    ///
    /// Requests already running still complete for the subscribers awaiting
    /// them, but no longer write the cache.
    pub fn clear(&self) {
        self.cache.clear();
        self.in_flight.clear();
    }

    fn get_cache<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self
            .cache
            .get(key)
            .and_then(|slot| slot.downcast_ref::<CacheEntry<T>>().cloned())?;

        if entry.is_expired(self.config.cache_time) {
            debug!(key, "evicting expired cache entry");
            self.cache.remove(key);
            return None;
        }
        Some(entry)
    }

    /// Returns the running request for `key`, starting one if there is none.
    fn fetch_shared<V>(&self, key: &str, fetcher: &Fetcher<V>) -> SharedFetch<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Some(shared) = occupied.get().fetch.downcast_ref::<SharedFetch<V>>() {
                    debug!(key, "joining in-flight request");
                    return shared.clone();
                }
                // Same key registered with another value type: replace it.
                let (request, shared) = self.start_fetch(key, fetcher);
                occupied.insert(request);
                shared
            }
            Entry::Vacant(vacant) => {
                let (request, shared) = self.start_fetch(key, fetcher);
                vacant.insert(request);
                shared
            }
        }
    }

    /// Spawns the request and returns its registration with a handle to share.
    ///
    /// The task writes the cache and unregisters itself only while it is still
    /// the registered request for `key`.
    fn start_fetch<V>(&self, key: &str, fetcher: &Fetcher<V>) -> (InFlight, SharedFetch<V>)
    where
        V: Clone + Send + Sync + 'static,
    {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        info!(key, id, "starting request");
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let key = key.to_string();
        let request = fetcher();

        let task = tokio::spawn(async move {
            let result = request.await;
            match &result {
                Ok(data) => {
                    let current = in_flight.get(&key).is_some_and(|entry| entry.id == id);
                    if current {
                        debug!(key, id, "request succeeded");
                        cache.insert(key.clone(), Box::new(CacheEntry::new(data.clone())));
                    } else {
                        debug!(key, id, "request superseded, not caching");
                    }
                }
                Err(e) => warn!(key, id, error = %e, "request failed"),
            }
            in_flight.remove_if(&key, |_, entry| entry.id == id);
            result
        });

        let shared = async move {
            task.await
                .unwrap_or_else(|e| Err(QueryError::new(format!("request task failed: {e}"))))
        }
        .boxed()
        .shared();

        let registered = InFlight {
            id,
            fetch: Box::new(shared.clone()),
        };
        (registered, shared)
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription reporting the [`FetchState`] of one cache key.
///
/// Two queries with the same key and value type share a
/// [`SubscriptionId`], so the runtime keeps a single task for them.
pub struct Query<V> {
    key: String,
    fetcher: Fetcher<V>,
    client: Arc<QueryClient>,
}

impl<V> Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// # Arguments
    ///
    /// * `key` - cache key; queries with equal keys share cache and requests
    /// * `fetcher` - builds the request future; called at most once per request
    /// * `client` - the shared cache owner
    pub fn new<F>(key: &impl ToString, fetcher: F, client: Arc<QueryClient>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<V, QueryError>> + Send + Sync + 'static,
    {
        Self {
            key: key.to_string(),
            fetcher: Arc::new(fetcher),
            client,
        }
    }
}

impl<V> SubscriptionSource for Query<V>
where
    V: Clone + Send + Sync + 'static,
{
    type Output = FetchState<V>;

    fn stream(&self) -> BoxStream<'static, Self::Output> {
        let key = self.key.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let client = Arc::clone(&self.client);

        stream::unfold(Step::Initial, move |step| {
            let key = key.clone();
            let fetcher = Arc::clone(&fetcher);
            let client = Arc::clone(&client);

            async move {
                match step {
                    Step::Initial => match client.get_cache::<V>(&key) {
                        Some(cached) => {
                            let is_stale = cached.is_stale(client.config().stale_time);
                            let next = if is_stale { Step::Fetching } else { Step::Done };
                            let state = FetchState::Success {
                                data: cached.data,
                                is_stale,
                            };
                            Some((state, next))
                        }
                        None => Some((FetchState::Pending, Step::Fetching)),
                    },
                    Step::Fetching => {
                        // Another subscriber's request may have finished since
                        // this one reported Pending.
                        if let Some(cached) = client.get_cache::<V>(&key) {
                            if !cached.is_stale(client.config().stale_time) {
                                let state = FetchState::Success {
                                    data: cached.data,
                                    is_stale: false,
                                };
                                return Some((state, Step::Done));
                            }
                        }

                        let state = match client.fetch_shared(&key, &fetcher).await {
                            Ok(data) => FetchState::Success {
                                data,
                                is_stale: false,
                            },
                            Err(e) => FetchState::Error(e.to_string()),
                        };
                        Some((state, Step::Done))
                    }
                    Step::Done => None,
                }
            }
        })
        .boxed()
    }

    fn id(&self) -> SubscriptionId {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        SubscriptionId::of::<Self>(hasher.finish())
    }
}

impl<V> Hash for Query<V> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.key.hash(hasher);
    }
}

enum Step {
    Initial,
    Fetching,
    Done,
}
