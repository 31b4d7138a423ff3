//! Best-effort key-value cache with per-entry TTL.
//!
//! Backs the response cache, the rate-limit counter and the result cache.
//! Every operation is fallible with [`CacheUnavailable`]; callers treat an
//! error as a miss (or, for the rate limiter, as permission to proceed) and
//! never fail a run because of it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone, Error)]
#[error("cache unavailable: {0}")]
pub struct CacheUnavailable(pub String);

pub trait KvCache: Send + Sync {
    /// Fetch a JSON value, `Ok(None)` on miss or expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheUnavailable`] if the backing store cannot be reached.
    fn get_json(&self, key: &str) -> Result<Option<Value>, CacheUnavailable>;

    /// Store a JSON value that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheUnavailable`] if the backing store cannot be reached.
    fn set_json(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheUnavailable>;

    /// Atomically increment a counter and return the new value. The first
    /// increment of a fresh counter starts a `window` expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheUnavailable`] if the backing store cannot be reached.
    fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheUnavailable>;

    /// Remaining time to live for `key`, `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheUnavailable`] if the backing store cannot be reached.
    fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheUnavailable>;
}

#[derive(Debug, Clone)]
enum Slot {
    Json(Value),
    Counter(u64),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process [`KvCache`] shared through an `Arc` by every collector and
/// worker in the process.
///
/// Expiry runs on [`tokio::time::Instant`] so paused-clock tests can drive
/// window rollover deterministically.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, CacheUnavailable> {
        self.entries
            .lock()
            .map_err(|_| CacheUnavailable("memory cache lock poisoned".to_string()))
    }
}

impl KvCache for MemoryCache {
    fn get_json(&self, key: &str) -> Result<Option<Value>, CacheUnavailable> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.slot {
                Slot::Json(value) => Ok(Some(value.clone())),
                Slot::Counter(_) => Ok(None),
            },
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_json(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheUnavailable> {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::Json(value.clone()),
                expires_at,
            },
        );
        Ok(())
    }

    fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheUnavailable> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_live(now) {
                if let Slot::Counter(count) = &mut entry.slot {
                    *count += 1;
                    return Ok(*count);
                }
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::Counter(1),
                expires_at: now + window,
            },
        );
        Ok(1)
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheUnavailable> {
        let now = Instant::now();
        let entries = self.lock()?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at.saturating_duration_since(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn json_entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_json("profile:alice", &json!({"karma": 1}), Duration::from_secs(10))
            .unwrap();
        assert_eq!(
            cache.get_json("profile:alice").unwrap(),
            Some(json!({"karma": 1}))
        );

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get_json("profile:alice").unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn counter_restarts_after_window() {
        let cache = MemoryCache::new();
        let window = Duration::from_secs(60);
        assert_eq!(cache.incr_window("rate", window).unwrap(), 1);
        assert_eq!(cache.incr_window("rate", window).unwrap(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.incr_window("rate", window).unwrap(), 3);
        assert_eq!(cache.ttl("rate").unwrap(), Some(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.ttl("rate").unwrap(), None);
        assert_eq!(cache.incr_window("rate", window).unwrap(), 1);
    }

    #[test]
    fn counters_are_not_returned_as_json() {
        let cache = MemoryCache::new();
        cache.incr_window("rate", Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get_json("rate").unwrap(), None);
    }

    #[test]
    fn missing_key_has_no_ttl() {
        let cache = MemoryCache::new();
        assert_eq!(cache.ttl("nope").unwrap(), None);
        assert_eq!(cache.get_json("nope").unwrap(), None);
    }
}
