//! In-process [`SnapshotStore`] used when no database is configured and in
//! tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use botscope_core::Platform;

use crate::store::{AnalysisReport, NewAnalysis, SnapshotRow, SnapshotStore, SnapshotSummary};
use crate::DbError;

#[derive(Debug, Default)]
struct Inner {
    next_account_id: i64,
    next_snapshot_id: i64,
    accounts: HashMap<(Platform, String), i64>,
    reports: BTreeMap<i64, AnalysisReport>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.lock().reports.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn account_id(&self, platform: Platform, username: &str) -> Option<i64> {
        self.lock()
            .accounts
            .get(&(platform, username.to_string()))
            .copied()
    }

    /// Snapshots of `account_id`, newest first.
    fn reports_for(&self, account_id: i64) -> Vec<AnalysisReport> {
        let mut reports: Vec<AnalysisReport> = self
            .lock()
            .reports
            .values()
            .filter(|r| r.snapshot.account_id == account_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| {
            (b.snapshot.collected_at, b.snapshot.id).cmp(&(a.snapshot.collected_at, a.snapshot.id))
        });
        reports
    }
}

impl SnapshotStore for MemoryStore {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SnapshotRow, DbError> {
        let post_count = i32::try_from(analysis.post_count()).unwrap_or(i32::MAX);
        let comment_count = i32::try_from(analysis.comment_count()).unwrap_or(i32::MAX);
        let data_coverage_days = analysis.data_coverage_days();

        let mut inner = self.lock();
        let key = (analysis.platform, analysis.username.clone());
        let account_id = match inner.accounts.get(&key).copied() {
            Some(id) => id,
            None => {
                inner.next_account_id += 1;
                let id = inner.next_account_id;
                inner.accounts.insert(key, id);
                id
            }
        };

        inner.next_snapshot_id += 1;
        let snapshot = SnapshotRow {
            id: inner.next_snapshot_id,
            account_id,
            username: analysis.username,
            collected_at: analysis.collected_at,
            post_count,
            comment_count,
            data_coverage_days,
            collector_version: analysis.collector_version,
        };
        inner.reports.insert(
            snapshot.id,
            AnalysisReport {
                snapshot: snapshot.clone(),
                items: analysis.items,
                features: analysis.features,
                score: analysis.score,
            },
        );
        Ok(snapshot)
    }

    async fn latest_snapshot(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Option<SnapshotRow>, DbError> {
        let Some(account_id) = self.account_id(platform, username) else {
            return Ok(None);
        };
        Ok(self
            .reports_for(account_id)
            .into_iter()
            .next()
            .map(|r| r.snapshot))
    }

    async fn list_snapshots(
        &self,
        platform: Platform,
        username: &str,
        limit: usize,
    ) -> Result<Vec<SnapshotSummary>, DbError> {
        let Some(account_id) = self.account_id(platform, username) else {
            return Ok(Vec::new());
        };
        Ok(self
            .reports_for(account_id)
            .into_iter()
            .take(limit)
            .map(|r| SnapshotSummary {
                automation_score: r.score.automation_score,
                coordination_score: r.score.coordination_score,
                confidence: r.score.confidence,
                snapshot: r.snapshot,
            })
            .collect())
    }

    async fn load_report(&self, snapshot_id: i64) -> Result<AnalysisReport, DbError> {
        self.lock()
            .reports
            .get(&snapshot_id)
            .cloned()
            .ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botscope_core::{
        ContentFeatures, CoverageFlags, Explanations, FeatureSet, InteractionFeatures, Item,
        ItemKind, RepetitionFeatures, ScoreResult, TimingFeatures,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn features() -> FeatureSet {
        FeatureSet {
            timing: TimingFeatures {
                posts_per_day: 0.5,
                comments_per_day: 1.0,
                active_hours_histogram: [0; 24],
                sleep_gap_hours_p95: 4.0,
                burstiness_index: 1.2,
                regularity_score: 0.45,
                span_days: 2.0,
                total_items: 3,
                timestamp_completeness: 1.0,
            },
            repetition: RepetitionFeatures {
                near_duplicate_rate: 0.0,
                top_phrase_reuse: 0.0,
                link_domain_concentration: 0.0,
                top_domain: None,
                subreddit_entropy: 1.0,
            },
            content: ContentFeatures {
                avg_comment_length: 10.0,
                median_comment_length: 10.0,
                url_rate: 0.0,
            },
            interaction: InteractionFeatures {
                unique_threads_replied_to: 2,
                top_level_reply_rate: 1.0,
            },
            coverage_flags: CoverageFlags {
                has_items: true,
                has_timestamps: true,
                has_comments: true,
                has_posts: true,
            },
        }
    }

    fn item(kind: ItemKind, id: &str) -> Item {
        Item {
            kind,
            item_id: id.to_string(),
            created_utc: Some(1_700_000_000.0),
            subreddit: Some("rust".to_string()),
            permalink: None,
            body_text: None,
            url: None,
            link_id: None,
            parent_id: None,
        }
    }

    fn analysis(username: &str, collected_at: DateTime<Utc>, automation: u8) -> NewAnalysis {
        NewAnalysis {
            platform: Platform::Reddit,
            username: username.to_string(),
            collected_at,
            collector_version: "v0.1".to_string(),
            items: vec![
                item(ItemKind::Post, "t3_a"),
                item(ItemKind::Comment, "t1_b"),
                item(ItemKind::Comment, "t1_c"),
            ],
            features: features(),
            score: ScoreResult {
                automation_score: automation,
                coordination_score: Some(5),
                confidence: Some(0.4),
                reasons: Vec::new(),
                explanations: Explanations {
                    coverage: features().coverage_flags,
                    confidence: 0.4,
                },
            },
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn save_counts_kinds_and_reuses_account() {
        let store = MemoryStore::new();
        let first = store.save_analysis(analysis("alice", t0(), 10)).await.unwrap();
        let second = store
            .save_analysis(analysis("alice", t0() + Duration::hours(1), 20))
            .await
            .unwrap();
        let other = store.save_analysis(analysis("bob", t0(), 30)).await.unwrap();

        assert_eq!(first.post_count, 1);
        assert_eq!(first.comment_count, 2);
        assert_eq!(first.data_coverage_days, 2.0);
        assert_eq!(first.account_id, second.account_id);
        assert_ne!(first.account_id, other.account_id);
        assert_ne!(first.id, second.id);
        assert_eq!(store.snapshot_count(), 3);
    }

    #[tokio::test]
    async fn latest_is_max_by_collected_at_then_id() {
        let store = MemoryStore::new();
        store
            .save_analysis(analysis("alice", t0() + Duration::hours(2), 10))
            .await
            .unwrap();
        store.save_analysis(analysis("alice", t0(), 20)).await.unwrap();
        let tie = store
            .save_analysis(analysis("alice", t0() + Duration::hours(2), 30))
            .await
            .unwrap();

        let latest = store
            .latest_snapshot(Platform::Reddit, "alice")
            .await
            .unwrap()
            .expect("alice has snapshots");
        assert_eq!(latest.id, tie.id);
    }

    #[tokio::test]
    async fn unknown_account_has_no_snapshots() {
        let store = MemoryStore::new();
        assert!(store
            .latest_snapshot(Platform::Reddit, "nobody")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .list_snapshots(Platform::Reddit, "nobody", 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let store = MemoryStore::new();
        for (hour, score) in [(0, 10), (1, 20), (2, 30)] {
            store
                .save_analysis(analysis("alice", t0() + Duration::hours(hour), score))
                .await
                .unwrap();
        }
        let history = store
            .list_snapshots(Platform::Reddit, "alice", 2)
            .await
            .unwrap();
        let scores: Vec<u8> = history.iter().map(|s| s.automation_score).collect();
        assert_eq!(scores, [30, 20]);
    }

    #[tokio::test]
    async fn load_report_round_trips_children() {
        let store = MemoryStore::new();
        let saved = store.save_analysis(analysis("alice", t0(), 42)).await.unwrap();
        let report = store.load_report(saved.id).await.unwrap();
        assert_eq!(report.snapshot, saved);
        assert_eq!(report.items.len(), 3);
        assert_eq!(report.score.automation_score, 42);
        assert_eq!(report.features, features());

        assert!(matches!(
            store.load_report(saved.id + 100).await,
            Err(DbError::NotFound)
        ));
    }
}
