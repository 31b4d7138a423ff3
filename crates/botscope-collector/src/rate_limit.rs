//! Outbound request rate limiting shared by every concurrent collection run.
//!
//! Two independent brakes apply before each Reddit call:
//!
//! - a fixed-window counter in the [`KvCache`] caps requests per minute;
//! - server-advertised quota (`x-ratelimit-remaining` / `x-ratelimit-reset`)
//!   blocks all callers until the advertised reset once the quota is nearly
//!   spent.
//!
//! The limiter fails open: if the cache is unavailable the request proceeds.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::KvCache;

const WINDOW: Duration = Duration::from_secs(60);
const MIN_SLEEP: Duration = Duration::from_secs(1);

pub struct RateLimiter {
    cache: Arc<dyn KvCache>,
    key: String,
    limit: u64,
    blocked_until: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `limit_per_minute` acquisitions per window
    /// on counter `key`.
    #[must_use]
    pub fn new(cache: Arc<dyn KvCache>, key: impl Into<String>, limit_per_minute: u64) -> Self {
        Self {
            cache,
            key: key.into(),
            limit: limit_per_minute.max(1),
            blocked_until: Mutex::new(None),
        }
    }

    /// Waits until one external request is permitted.
    ///
    /// Never errors: an over-limit caller sleeps for the rest of the window
    /// and tries again, and an unreachable cache lets the caller through.
    pub async fn acquire(&self) {
        self.wait_for_server_reset().await;

        loop {
            let count = match self.cache.incr_window(&self.key, WINDOW) {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "rate limiter cache unavailable; permitting request");
                    return;
                }
            };
            if count <= self.limit {
                return;
            }

            let remaining = match self.cache.ttl(&self.key) {
                Ok(Some(ttl)) => ttl,
                Ok(None) => MIN_SLEEP,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "rate limiter cache unavailable; permitting request");
                    return;
                }
            };
            let sleep_for = remaining.max(MIN_SLEEP);
            tracing::debug!(
                key = %self.key,
                count,
                limit = self.limit,
                sleep_ms = u64::try_from(sleep_for.as_millis()).unwrap_or(u64::MAX),
                "request quota exhausted for this window; waiting for rollover"
            );
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Records the server's quota headers from a successful response.
    ///
    /// When at most one request remains, every subsequent [`acquire`] waits
    /// until `reset_secs` (at least one second) from now.
    ///
    /// [`acquire`]: RateLimiter::acquire
    pub fn observe_quota(&self, remaining: f64, reset_secs: f64) {
        if !remaining.is_finite() || remaining > 1.0 {
            return;
        }
        let wait = if reset_secs.is_finite() && reset_secs > 1.0 {
            Duration::from_secs_f64(reset_secs)
        } else {
            MIN_SLEEP
        };
        let until = Instant::now() + wait;

        let Ok(mut blocked) = self.blocked_until.lock() else {
            return;
        };
        if blocked.is_none_or(|current| current < until) {
            *blocked = Some(until);
        }
        tracing::warn!(
            remaining,
            reset_secs,
            "server quota nearly exhausted; pausing requests until reset"
        );
    }

    async fn wait_for_server_reset(&self) {
        let until = match self.blocked_until.lock() {
            Ok(guard) => *guard,
            Err(_) => None,
        };
        if let Some(until) = until {
            if until > Instant::now() {
                tokio::time::sleep_until(until).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheUnavailable, MemoryCache};
    use serde_json::Value;

    struct UnreachableCache;

    impl KvCache for UnreachableCache {
        fn get_json(&self, _key: &str) -> Result<Option<Value>, CacheUnavailable> {
            Err(CacheUnavailable("down".to_string()))
        }
        fn set_json(&self, _key: &str, _v: &Value, _ttl: Duration) -> Result<(), CacheUnavailable> {
            Err(CacheUnavailable("down".to_string()))
        }
        fn incr_window(&self, _key: &str, _w: Duration) -> Result<u64, CacheUnavailable> {
            Err(CacheUnavailable("down".to_string()))
        }
        fn ttl(&self, _key: &str) -> Result<Option<Duration>, CacheUnavailable> {
            Err(CacheUnavailable("down".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn caller_over_limit_blocks_until_window_rollover() {
        let limiter = RateLimiter::new(Arc::new(MemoryCache::new()), "rate:test", 100);
        let start = Instant::now();

        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start, "first 100 acquisitions must not wait");

        limiter.acquire().await;
        assert!(
            Instant::now().duration_since(start) >= Duration::from_secs(60),
            "101st acquisition should wait for the window to roll over"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_cache_fails_open() {
        let limiter = RateLimiter::new(Arc::new(UnreachableCache), "rate:test", 1);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn low_server_quota_delays_next_acquire_until_reset() {
        let limiter = RateLimiter::new(Arc::new(MemoryCache::new()), "rate:test", 100);
        limiter.observe_quota(1.0, 12.0);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(Instant::now().duration_since(start) >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_server_quota_does_not_delay() {
        let limiter = RateLimiter::new(Arc::new(MemoryCache::new()), "rate:test", 100);
        limiter.observe_quota(57.0, 300.0);

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn tiny_reset_is_floored_to_one_second() {
        let limiter = RateLimiter::new(Arc::new(MemoryCache::new()), "rate:test", 100);
        limiter.observe_quota(0.0, 0.0);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(Instant::now().duration_since(start) >= Duration::from_secs(1));
    }
}
