//! Freshness check that lets a submission skip the pipeline.
//!
//! The key-value cache is consulted first; on a miss the store's latest
//! snapshot is checked and, when fresh, written back to the cache. Cache and
//! store failures are logged and treated as misses.

use std::sync::Arc;
use std::time::Duration;

use botscope_collector::KvCache;
use botscope_core::{Platform, SnapshotRef};
use botscope_db::SnapshotStore;
use chrono::{DateTime, TimeDelta, Utc};

pub struct ResultCache {
    kv: Arc<dyn KvCache>,
    freshness: TimeDelta,
}

impl ResultCache {
    #[must_use]
    pub fn new(kv: Arc<dyn KvCache>, freshness: TimeDelta) -> Self {
        Self { kv, freshness }
    }

    #[must_use]
    pub fn key(platform: Platform, username: &str) -> String {
        format!("result:{platform}:{username}")
    }

    /// Whether a snapshot collected at `collected_at` is still served at `now`.
    #[must_use]
    pub fn is_fresh(&self, collected_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(collected_at) <= self.freshness
    }

    /// A fresh snapshot for `username`, if one exists.
    pub async fn lookup<S: SnapshotStore>(
        &self,
        store: &S,
        username: &str,
        now: DateTime<Utc>,
    ) -> Option<SnapshotRef> {
        let key = Self::key(Platform::Reddit, username);

        match self.kv.get_json(&key) {
            Ok(Some(value)) => match serde_json::from_value::<SnapshotRef>(value) {
                Ok(snapshot) if self.is_fresh(snapshot.collected_at, now) => {
                    tracing::debug!(username, snapshot_id = snapshot.snapshot_id, "result cache hit");
                    return Some(snapshot);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(username, error = %e, "discarding unreadable cached result"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(username, error = %e, "result cache unavailable; checking store"),
        }

        let latest = match store.latest_snapshot(Platform::Reddit, username).await {
            Ok(latest) => latest?,
            Err(e) => {
                tracing::warn!(username, error = %e, "latest snapshot lookup failed; treating as miss");
                return None;
            }
        };
        if !self.is_fresh(latest.collected_at, now) {
            tracing::debug!(username, snapshot_id = latest.id, "latest snapshot is stale");
            return None;
        }

        let snapshot = latest.to_ref();
        let remaining = self.freshness - now.signed_duration_since(snapshot.collected_at);
        self.write(&key, &snapshot, remaining);
        tracing::debug!(username, snapshot_id = snapshot.snapshot_id, "fresh snapshot found in store");
        Some(snapshot)
    }

    /// Records a just-persisted snapshot for the full freshness window.
    pub fn remember(&self, snapshot: &SnapshotRef) {
        let key = Self::key(Platform::Reddit, &snapshot.username);
        self.write(&key, snapshot, self.freshness);
    }

    fn write(&self, key: &str, snapshot: &SnapshotRef, ttl: TimeDelta) {
        let ttl = ttl.to_std().unwrap_or(Duration::ZERO);
        if ttl.is_zero() {
            return;
        }
        let value = match serde_json::to_value(snapshot) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not encode result cache entry");
                return;
            }
        };
        if let Err(e) = self.kv.set_json(key, &value, ttl) {
            tracing::warn!(key, error = %e, "result cache unavailable; not caching");
        }
    }
}
