use std::time::{Duration, Instant};

/// A cached query value with the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
        }
    }

    /// Whether the entry is older than `stale_time`.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.timestamp.elapsed() > stale_time
    }

    /// Whether the entry is older than `cache_time` and should be evicted.
    pub fn is_expired(&self, cache_time: Duration) -> bool {
        self.timestamp.elapsed() > cache_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_fresh_entry() {
        let entry = CacheEntry::new(42);
        assert_eq!(entry.data, 42);
        assert!(!entry.is_stale(Duration::from_secs(1)));
        assert!(!entry.is_expired(Duration::from_secs(1)));
    }

    #[test]
    fn test_entry_goes_stale_then_expires() {
        let entry = CacheEntry::new(42);
        sleep(Duration::from_millis(10));
        assert!(entry.is_stale(Duration::from_millis(5)));
        assert!(!entry.is_expired(Duration::from_secs(60)));
        assert!(entry.is_expired(Duration::from_millis(5)));
    }
}
