//! `analyze` and `check-credentials` command handlers.
//!
//! Every input is submitted to one [`JobRunner`], then all jobs are awaited
//! concurrently. Per-account failures are reported and counted rather than
//! aborting the batch.

use std::sync::Arc;

use botscope_collector::{CollectorConfig, KvCache, MemoryCache, RedditClient};
use botscope_core::AppConfig;
use botscope_db::SnapshotStore;
use botscope_worker::{JobRunner, JobState, JobStatus, RunnerConfig};
use futures::future::join_all;

use crate::query::render_report;
use crate::store::AnyStore;

type Runner = JobRunner<RedditClient, AnyStore>;

fn build_client(config: &AppConfig, cache: Arc<dyn KvCache>) -> anyhow::Result<RedditClient> {
    RedditClient::from_config(&CollectorConfig::from_app_config(config), cache)
        .map_err(|e| anyhow::anyhow!("failed to build Reddit client: {e}"))
}

/// Analyze every input and print one report per account.
///
/// # Errors
///
/// Returns an error if the client cannot be built, or once all jobs have
/// settled if any input was rejected or any job failed.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    store: AnyStore,
    inputs: &[String],
    force: bool,
    max_items: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
    let client = build_client(config, Arc::clone(&cache))?;

    let mut runner_config = RunnerConfig::from_app_config(config);
    if let Some(limit) = max_items {
        runner_config.max_items = limit;
    }
    let runner = JobRunner::new(client, Arc::new(store), cache, runner_config);

    let mut failures = 0_usize;
    let mut job_ids = Vec::new();
    for input in inputs {
        match runner.submit(input, force).await {
            Ok(submission) => job_ids.push(submission.job_id().to_string()),
            Err(e) => {
                eprintln!("error: {input}: {e}");
                failures += 1;
            }
        }
    }

    let statuses = join_all(job_ids.iter().map(|id| await_job(&runner, id))).await;
    runner.shutdown().await;

    let mut reports = Vec::new();
    for status in statuses.into_iter().flatten() {
        match (status.state, &status.result) {
            (JobState::Finished | JobState::Cached, Some(snapshot)) => {
                match runner.store().load_report(snapshot.snapshot_id).await {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        eprintln!("error: u/{}: could not load report: {e}", status.username);
                        failures += 1;
                    }
                }
            }
            _ => {
                eprintln!(
                    "error: u/{}: {}",
                    status.username,
                    status.error.as_deref().unwrap_or("job did not complete")
                );
                failures += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (i, report) in reports.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print!("{}", render_report(report));
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} analyses failed", inputs.len());
    }
    Ok(())
}

/// Follows one job to a terminal state, printing progress to stderr.
async fn await_job(runner: &Runner, job_id: &str) -> Option<JobStatus> {
    let mut rx = runner.subscribe(job_id)?;
    let mut last_percent = None;
    loop {
        {
            let status = rx.borrow_and_update();
            let percent = progress_percent(status.progress);
            if last_percent != Some(percent) {
                eprintln!("u/{}: {} {percent:>3}%", status.username, status.state);
                last_percent = Some(percent);
            }
            if status.state.is_terminal() {
                return Some(status.clone());
            }
        }
        if rx.changed().await.is_err() {
            return Some(rx.borrow().clone());
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn progress_percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Perform only the token exchange.
///
/// # Errors
///
/// Returns an error if credentials are missing or rejected.
pub(crate) async fn run_check_credentials(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_client(config, Arc::new(MemoryCache::new()))?;
    client.check_credentials().await?;
    println!("Reddit credentials OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_whole_percent() {
        assert_eq!(progress_percent(0.0), 0);
        assert_eq!(progress_percent(0.55), 55);
        assert_eq!(progress_percent(1.0), 100);
        assert_eq!(progress_percent(1.7), 100);
    }
}
