//! Offline tests for botscope-db pool configuration and row types.
//! These tests do not require a live database connection.

use botscope_core::AppConfig;
use botscope_db::{DbError, PoolConfig, SnapshotRow};
use chrono::{TimeZone, Utc};

fn app_config(database_url: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: database_url.map(str::to_string),
        log_level: "info".to_string(),
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: "ua".to_string(),
        reddit_max_items: 200,
        reddit_qpm_limit: 100,
        request_timeout_secs: 30,
        retry_delay_secs: 5,
        collector_version: "v0.1".to_string(),
        cache_hours: 6,
        worker_count: 4,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config(Some("postgres://example")));
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_without_database_url_is_a_typed_error() {
    let err = botscope_db::connect_pool_from_config(&app_config(None))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::MissingDatabaseUrl));
}

/// Compile-time smoke test: confirm that [`SnapshotRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn snapshot_row_converts_to_reference() {
    let collected_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let row = SnapshotRow {
        id: 7_i64,
        account_id: 3_i64,
        username: "alice".to_string(),
        collected_at,
        post_count: 4_i32,
        comment_count: 6_i32,
        data_coverage_days: 12.5,
        collector_version: "v0.1".to_string(),
    };

    let reference = row.to_ref();
    assert_eq!(reference.snapshot_id, 7);
    assert_eq!(reference.username, "alice");
    assert_eq!(reference.collected_at, collected_at);
}
