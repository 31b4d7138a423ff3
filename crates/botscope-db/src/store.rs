//! The durable-store seam used by the job runner and the CLI.

use std::future::Future;

use botscope_core::{FeatureSet, Item, Platform, ScoreResult, SnapshotRef};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::DbError;

/// Everything produced by one completed pipeline run, persisted as a unit.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub platform: Platform,
    pub username: String,
    pub collected_at: DateTime<Utc>,
    pub collector_version: String,
    pub items: Vec<Item>,
    pub features: FeatureSet,
    pub score: ScoreResult,
}

impl NewAnalysis {
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_post()).count()
    }

    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_comment()).count()
    }

    /// Observed span of the collected activity in days.
    #[must_use]
    pub fn data_coverage_days(&self) -> f64 {
        self.features.timing.span_days
    }
}

/// A row from the `snapshots` table joined with its account handle.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub account_id: i64,
    pub username: String,
    pub collected_at: DateTime<Utc>,
    pub post_count: i32,
    pub comment_count: i32,
    pub data_coverage_days: f64,
    pub collector_version: String,
}

impl SnapshotRow {
    #[must_use]
    pub fn to_ref(&self) -> SnapshotRef {
        SnapshotRef {
            snapshot_id: self.id,
            username: self.username.clone(),
            collected_at: self.collected_at,
        }
    }
}

/// A snapshot with its headline scores, for history listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub snapshot: SnapshotRow,
    pub automation_score: u8,
    pub coordination_score: Option<u8>,
    pub confidence: Option<f64>,
}

/// A snapshot with all of its owned children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub snapshot: SnapshotRow,
    pub items: Vec<Item>,
    pub features: FeatureSet,
    pub score: ScoreResult,
}

/// Durable persistence of accounts, snapshots and their children.
pub trait SnapshotStore: Send + Sync {
    /// Upserts the account and writes the snapshot, items, feature set and
    /// score in one transaction. Nothing is visible if any write fails.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any write fails; the store is left unchanged.
    fn save_analysis(
        &self,
        analysis: NewAnalysis,
    ) -> impl Future<Output = Result<SnapshotRow, DbError>> + Send;

    /// The account's most recent snapshot by `(collected_at, id)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    fn latest_snapshot(
        &self,
        platform: Platform,
        username: &str,
    ) -> impl Future<Output = Result<Option<SnapshotRow>, DbError>> + Send;

    /// Up to `limit` snapshots for the account, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    fn list_snapshots(
        &self,
        platform: Platform,
        username: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SnapshotSummary>, DbError>> + Send;

    /// The full report for one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown id, or another
    /// [`DbError`] if the lookup fails.
    fn load_report(
        &self,
        snapshot_id: i64,
    ) -> impl Future<Output = Result<AnalysisReport, DbError>> + Send;
}
