//! One end-to-end analysis run: collect, extract, score, persist.

use botscope_analysis::{
    compute_content_features, compute_coverage_flags, compute_interaction_features,
    compute_repetition_features, compute_timing_features, score,
};
use botscope_collector::ActivitySource;
use botscope_core::{FeatureSet, Platform};
use botscope_db::{NewAnalysis, SnapshotRow, SnapshotStore};
use chrono::Utc;

use crate::error::PipelineError;

pub const PROGRESS_STARTED: f64 = 0.05;
pub const PROGRESS_COLLECTED: f64 = 0.40;
pub const PROGRESS_TIMING: f64 = 0.50;
pub const PROGRESS_REPETITION: f64 = 0.55;
pub const PROGRESS_CONTENT: f64 = 0.60;
pub const PROGRESS_INTERACTION: f64 = 0.65;
pub const PROGRESS_SCORED: f64 = 0.80;
pub const PROGRESS_PERSISTED: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_items: usize,
    pub collector_version: String,
}

/// Runs the pipeline for an already-validated `username`.
///
/// `progress` is called after each stage with a strictly increasing value
/// between [`PROGRESS_COLLECTED`] and [`PROGRESS_PERSISTED`]. Nothing is
/// persisted unless every stage succeeds.
///
/// # Errors
///
/// Returns [`PipelineError::Collector`] when collection fails and
/// [`PipelineError::Store`] when the snapshot cannot be written.
pub async fn run_pipeline<C, S, P>(
    source: &C,
    store: &S,
    username: &str,
    settings: &PipelineSettings,
    progress: P,
) -> Result<SnapshotRow, PipelineError>
where
    C: ActivitySource,
    S: SnapshotStore,
    P: Fn(f64) + Send + Sync,
{
    let collected_at = Utc::now();
    let activity = source.collect(username, settings.max_items).await?;
    tracing::debug!(
        username,
        items = activity.items.len(),
        "collection complete"
    );
    progress(PROGRESS_COLLECTED);

    let items = activity.items;
    let timing = compute_timing_features(&items);
    progress(PROGRESS_TIMING);
    let repetition = compute_repetition_features(&items);
    progress(PROGRESS_REPETITION);
    let content = compute_content_features(&items);
    progress(PROGRESS_CONTENT);
    let interaction = compute_interaction_features(&items);
    progress(PROGRESS_INTERACTION);

    let coverage_flags = compute_coverage_flags(&items, &timing);
    let features = FeatureSet {
        timing,
        repetition,
        content,
        interaction,
        coverage_flags,
    };

    let result = score(&features, &activity.profile, &items, Utc::now());
    tracing::debug!(
        username,
        automation_score = result.automation_score,
        reasons = result.reasons.len(),
        "scoring complete"
    );
    progress(PROGRESS_SCORED);

    let row = store
        .save_analysis(NewAnalysis {
            platform: Platform::Reddit,
            username: username.to_string(),
            collected_at,
            collector_version: settings.collector_version.clone(),
            items,
            features,
            score: result,
        })
        .await?;
    progress(PROGRESS_PERSISTED);

    Ok(row)
}
