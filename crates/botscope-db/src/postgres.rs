//! Postgres-backed [`SnapshotStore`].

use botscope_core::{Explanations, FeatureSet, Item, ItemKind, Platform, Reason, ScoreResult};
use serde_json::Value;
use sqlx::PgPool;

use crate::store::{AnalysisReport, NewAnalysis, SnapshotRow, SnapshotStore, SnapshotSummary};
use crate::DbError;

const SNAPSHOT_SELECT: &str = "SELECT s.id, s.account_id, a.handle AS username, s.collected_at, \
            s.post_count, s.comment_count, s.data_coverage_days, s.collector_version \
     FROM snapshots s \
     JOIN accounts a ON a.id = s.account_id";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    snapshot: SnapshotRow,
    automation_score: i16,
    coordination_score: Option<i16>,
    confidence: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    kind: String,
    item_id: String,
    created_utc: Option<f64>,
    subreddit: Option<String>,
    permalink: Option<String>,
    body_text: Option<String>,
    url: Option<String>,
    link_id: Option<String>,
    parent_id: Option<String>,
}

impl ItemRow {
    fn into_item(self) -> Result<Item, DbError> {
        let kind: ItemKind = serde_json::from_value(Value::String(self.kind))?;
        Ok(Item {
            kind,
            item_id: self.item_id,
            created_utc: self.created_utc,
            subreddit: self.subreddit,
            permalink: self.permalink,
            body_text: self.body_text,
            url: self.url,
            link_id: self.link_id,
            parent_id: self.parent_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScoreRow {
    automation_score: i16,
    coordination_score: Option<i16>,
    confidence: Option<f64>,
    reasons: Value,
    explanations: Value,
}

impl ScoreRow {
    fn into_score(self) -> Result<ScoreResult, DbError> {
        let reasons: Vec<Reason> = serde_json::from_value(self.reasons)?;
        let explanations: Explanations = serde_json::from_value(self.explanations)?;
        Ok(ScoreResult {
            automation_score: score_to_u8(self.automation_score),
            coordination_score: self.coordination_score.map(score_to_u8),
            confidence: self.confidence,
            reasons,
            explanations,
        })
    }
}

fn score_to_u8(value: i16) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

fn count_to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SnapshotStore for PgStore {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SnapshotRow, DbError> {
        let features = serde_json::to_value(&analysis.features)?;
        let reasons = serde_json::to_value(&analysis.score.reasons)?;
        let explanations = serde_json::to_value(&analysis.score.explanations)?;

        let mut tx = self.pool.begin().await?;

        let account_id: i64 = sqlx::query_scalar(
            "INSERT INTO accounts (platform, handle) \
             VALUES ($1, $2) \
             ON CONFLICT (platform, handle) DO UPDATE SET handle = EXCLUDED.handle \
             RETURNING id",
        )
        .bind(analysis.platform.as_str())
        .bind(&analysis.username)
        .fetch_one(&mut *tx)
        .await?;

        let snapshot_id: i64 = sqlx::query_scalar(
            "INSERT INTO snapshots \
                 (account_id, collected_at, post_count, comment_count, \
                  data_coverage_days, collector_version) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(account_id)
        .bind(analysis.collected_at)
        .bind(count_to_i32(analysis.post_count()))
        .bind(count_to_i32(analysis.comment_count()))
        .bind(analysis.data_coverage_days())
        .bind(&analysis.collector_version)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in analysis.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO items \
                     (snapshot_id, position, kind, item_id, created_utc, subreddit, \
                      permalink, body_text, url, link_id, parent_id) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(snapshot_id)
            .bind(count_to_i32(position))
            .bind(item.kind.as_str())
            .bind(&item.item_id)
            .bind(item.created_utc)
            .bind(&item.subreddit)
            .bind(&item.permalink)
            .bind(&item.body_text)
            .bind(&item.url)
            .bind(&item.link_id)
            .bind(&item.parent_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO feature_sets (snapshot_id, features) VALUES ($1, $2)")
            .bind(snapshot_id)
            .bind(features)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO scores \
                 (snapshot_id, automation_score, coordination_score, confidence, \
                  reasons, explanations) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(snapshot_id)
        .bind(i16::from(analysis.score.automation_score))
        .bind(analysis.score.coordination_score.map(i16::from))
        .bind(analysis.score.confidence)
        .bind(reasons)
        .bind(explanations)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, SnapshotRow>(&format!("{SNAPSHOT_SELECT} WHERE s.id = $1"))
            .bind(snapshot_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            snapshot_id,
            username = %row.username,
            items = analysis.items.len(),
            "persisted analysis"
        );
        Ok(row)
    }

    async fn latest_snapshot(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Option<SnapshotRow>, DbError> {
        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "{SNAPSHOT_SELECT} \
             WHERE a.platform = $1 AND a.handle = $2 \
             ORDER BY s.collected_at DESC, s.id DESC \
             LIMIT 1"
        ))
        .bind(platform.as_str())
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_snapshots(
        &self,
        platform: Platform,
        username: &str,
        limit: usize,
    ) -> Result<Vec<SnapshotSummary>, DbError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT s.id, s.account_id, a.handle AS username, s.collected_at, \
                    s.post_count, s.comment_count, s.data_coverage_days, s.collector_version, \
                    sc.automation_score, sc.coordination_score, sc.confidence \
             FROM snapshots s \
             JOIN accounts a ON a.id = s.account_id \
             JOIN scores sc ON sc.snapshot_id = s.id \
             WHERE a.platform = $1 AND a.handle = $2 \
             ORDER BY s.collected_at DESC, s.id DESC \
             LIMIT $3",
        )
        .bind(platform.as_str())
        .bind(username)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SnapshotSummary {
                snapshot: row.snapshot,
                automation_score: score_to_u8(row.automation_score),
                coordination_score: row.coordination_score.map(score_to_u8),
                confidence: row.confidence,
            })
            .collect())
    }

    async fn load_report(&self, snapshot_id: i64) -> Result<AnalysisReport, DbError> {
        let snapshot = sqlx::query_as::<_, SnapshotRow>(&format!("{SNAPSHOT_SELECT} WHERE s.id = $1"))
            .bind(snapshot_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;

        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT kind, item_id, created_utc, subreddit, permalink, body_text, url, \
                    link_id, parent_id \
             FROM items \
             WHERE snapshot_id = $1 \
             ORDER BY position",
        )
        .bind(snapshot_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ItemRow::into_item)
        .collect::<Result<Vec<_>, _>>()?;

        let features: Value =
            sqlx::query_scalar("SELECT features FROM feature_sets WHERE snapshot_id = $1")
                .bind(snapshot_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DbError::NotFound)?;
        let features: FeatureSet = serde_json::from_value(features)?;

        let score = sqlx::query_as::<_, ScoreRow>(
            "SELECT automation_score, coordination_score, confidence, reasons, explanations \
             FROM scores \
             WHERE snapshot_id = $1",
        )
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?
        .into_score()?;

        Ok(AnalysisReport {
            snapshot,
            items,
            features,
            score,
        })
    }
}
