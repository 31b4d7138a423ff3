//! Store selection for the CLI: Postgres when `DATABASE_URL` is set, an
//! in-process store otherwise.

use botscope_core::{AppConfig, Platform};
use botscope_db::{
    AnalysisReport, DbError, MemoryStore, NewAnalysis, PgStore, SnapshotRow, SnapshotStore,
    SnapshotSummary,
};

pub(crate) enum AnyStore {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl AnyStore {
    /// Opens the configured store, applying pending migrations to Postgres.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or migrated.
    pub(crate) async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        if config.database_url.is_none() {
            tracing::warn!("DATABASE_URL is not set; results are kept in memory for this run only");
            return Ok(Self::Memory(MemoryStore::new()));
        }

        let pool = botscope_db::connect_pool_from_config(config).await?;
        let applied = botscope_db::run_migrations(&pool).await?;
        if applied > 0 {
            tracing::info!(applied, "applied pending migrations");
        }
        Ok(Self::Postgres(PgStore::new(pool)))
    }

    pub(crate) fn is_persistent(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }
}

impl SnapshotStore for AnyStore {
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<SnapshotRow, DbError> {
        match self {
            Self::Memory(store) => store.save_analysis(analysis).await,
            Self::Postgres(store) => store.save_analysis(analysis).await,
        }
    }

    async fn latest_snapshot(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<Option<SnapshotRow>, DbError> {
        match self {
            Self::Memory(store) => store.latest_snapshot(platform, username).await,
            Self::Postgres(store) => store.latest_snapshot(platform, username).await,
        }
    }

    async fn list_snapshots(
        &self,
        platform: Platform,
        username: &str,
        limit: usize,
    ) -> Result<Vec<SnapshotSummary>, DbError> {
        match self {
            Self::Memory(store) => store.list_snapshots(platform, username, limit).await,
            Self::Postgres(store) => store.list_snapshots(platform, username, limit).await,
        }
    }

    async fn load_report(&self, snapshot_id: i64) -> Result<AnalysisReport, DbError> {
        match self {
            Self::Memory(store) => store.load_report(snapshot_id).await,
            Self::Postgres(store) => store.load_report(snapshot_id).await,
        }
    }
}
