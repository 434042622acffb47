use std::time::Duration;

/// Users count as fresh for no time at all: every new subscriber refetches.
pub const DEFAULT_STALE_TIME: Duration = Duration::ZERO;

/// Cached users are dropped five minutes after they were stored.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(5 * 60);

/// Freshness and retention windows of the query cache.
///
/// Both windows are measured from the moment a successful response was
/// stored. `stale_time` should not exceed `cache_time`; an entry evicted
/// before going stale is simply refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Within this window a subscriber gets the cached users and no request.
    /// Past it, the cached users are shown marked stale while a refetch runs.
    pub stale_time: Duration,

    /// Past this window the entry is evicted on the next read.
    pub cache_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME, DEFAULT_CACHE_TIME)
    }
}

impl QueryConfig {
    #[must_use]
    pub const fn new(stale_time: Duration, cache_time: Duration) -> Self {
        Self {
            stale_time,
            cache_time,
        }
    }
}
