//! Background job runner.
//!
//! Submissions are validated, checked against the result cache and, on a
//! miss, pushed onto an unbounded queue drained by a fixed pool of tokio
//! workers. Each job's status lives in a `watch` channel so callers can poll
//! [`JobRunner::status`] or await changes through [`JobRunner::subscribe`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use botscope_collector::{ActivitySource, KvCache};
use botscope_core::{parse_username, AppConfig};
use botscope_db::SnapshotStore;
use chrono::{TimeDelta, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::SubmitError;
use crate::job::{JobState, JobStatus, Submission};
use crate::pipeline::{run_pipeline, PipelineSettings, PROGRESS_STARTED};
use crate::result_cache::ResultCache;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub worker_count: usize,
    pub max_items: usize,
    pub collector_version: String,
    /// Snapshots younger than this are served instead of re-running.
    pub freshness: TimeDelta,
    /// How long a settled job stays visible to `status` and `subscribe`.
    pub status_retention: Duration,
}

pub const DEFAULT_STATUS_RETENTION: Duration = Duration::from_secs(60 * 60);

impl RunnerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let hours = i64::try_from(config.cache_hours).unwrap_or(i64::MAX);
        Self {
            worker_count: config.worker_count.max(1),
            max_items: config.reddit_max_items,
            collector_version: config.collector_version.clone(),
            freshness: TimeDelta::try_hours(hours).unwrap_or(TimeDelta::MAX),
            status_retention: DEFAULT_STATUS_RETENTION,
        }
    }
}

#[derive(Debug)]
struct QueuedJob {
    job_id: String,
    username: String,
}

type JobQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedJob>>>;

struct JobEntry {
    tx: watch::Sender<JobStatus>,
    /// When the job reached a terminal state.
    settled_at: Option<Instant>,
}

type JobMap = HashMap<String, JobEntry>;

struct Shared<C, S> {
    source: C,
    store: Arc<S>,
    results: ResultCache,
    settings: PipelineSettings,
    retention: Duration,
    jobs: Mutex<JobMap>,
}

impl<C, S> Shared<C, S>
where
    C: ActivitySource,
    S: SnapshotStore,
{
    fn jobs(&self) -> MutexGuard<'_, JobMap> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a job, first dropping jobs that settled more than the retention
    /// period ago.
    fn register(&self, status: JobStatus) {
        let now = Instant::now();
        let settled_at = status.state.is_terminal().then_some(now);
        let job_id = status.job_id.clone();
        let (tx, _rx) = watch::channel(status);

        let mut jobs = self.jobs();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            entry
                .settled_at
                .is_none_or(|at| now.duration_since(at) < self.retention)
        });
        let pruned = before - jobs.len();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped settled job statuses");
        }
        jobs.insert(job_id, JobEntry { tx, settled_at });
    }

    fn update(&self, job_id: &str, apply: impl FnOnce(&mut JobStatus)) {
        if let Some(entry) = self.jobs().get_mut(job_id) {
            entry.tx.send_modify(apply);
            if entry.settled_at.is_none() && entry.tx.borrow().state.is_terminal() {
                entry.settled_at = Some(Instant::now());
            }
        }
    }

    fn fail(&self, job_id: &str, error: String) {
        self.update(job_id, |s| {
            s.state = JobState::Failed;
            s.error = Some(error);
        });
    }

    async fn run(&self, job: QueuedJob) {
        let QueuedJob { job_id, username } = job;
        tracing::info!(job_id = %job_id, username = %username, "job started");
        self.update(&job_id, |s| {
            s.state = JobState::Started;
            s.advance(PROGRESS_STARTED);
        });

        let outcome = run_pipeline(
            &self.source,
            self.store.as_ref(),
            &username,
            &self.settings,
            |value| self.update(&job_id, |s| s.advance(value)),
        )
        .await;

        match outcome {
            Ok(row) => {
                let snapshot = row.to_ref();
                self.results.remember(&snapshot);
                tracing::info!(
                    job_id = %job_id,
                    username = %username,
                    snapshot_id = snapshot.snapshot_id,
                    "job finished"
                );
                self.update(&job_id, |s| {
                    s.state = JobState::Finished;
                    s.advance(1.0);
                    s.result = Some(snapshot);
                });
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, username = %username, error = %e, "job failed");
                self.fail(&job_id, e.to_string());
            }
        }
    }
}

/// Runs analyses on a fixed pool of background workers.
pub struct JobRunner<C, S> {
    shared: Arc<Shared<C, S>>,
    queue: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<C, S> JobRunner<C, S>
where
    C: ActivitySource + 'static,
    S: SnapshotStore + 'static,
{
    /// Spawns `config.worker_count` workers on the current tokio runtime.
    #[must_use]
    pub fn new(source: C, store: Arc<S>, kv: Arc<dyn KvCache>, config: RunnerConfig) -> Self {
        let shared = Arc::new(Shared {
            source,
            store,
            results: ResultCache::new(kv, config.freshness),
            settings: PipelineSettings {
                max_items: config.max_items,
                collector_version: config.collector_version,
            },
            retention: config.status_retention,
            jobs: Mutex::new(HashMap::new()),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let rx: JobQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let worker_count = config.worker_count.max(1);
        let workers = (0..worker_count)
            .map(|worker| tokio::spawn(work(worker, Arc::clone(&shared), Arc::clone(&rx))))
            .collect();
        tracing::info!(worker_count, "job runner started");

        Self {
            shared,
            queue: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    /// Validates `input` and either returns a fresh cached snapshot or queues
    /// a new job. `force_refresh` skips the cache lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InvalidUsername`] when no username can be
    /// parsed from `input`, or [`SubmitError::ShutDown`] after
    /// [`JobRunner::shutdown`].
    pub async fn submit(&self, input: &str, force_refresh: bool) -> Result<Submission, SubmitError> {
        let username = parse_username(input)?;
        if self.sender().is_none() {
            return Err(SubmitError::ShutDown);
        }

        if !force_refresh {
            let store = self.shared.store.as_ref();
            if let Some(snapshot) = self.shared.results.lookup(store, &username, Utc::now()).await {
                let status = JobStatus::cached(snapshot);
                tracing::info!(username = %username, job_id = %status.job_id, "serving cached result");
                self.shared.register(status.clone());
                return Ok(Submission::Cached(status));
            }
        }

        let job_id = Uuid::new_v4().to_string();
        let status = JobStatus::queued(job_id.clone(), username.clone());
        self.shared.register(status.clone());

        let sent = self.sender().is_some_and(|tx| {
            tx.send(QueuedJob {
                job_id: job_id.clone(),
                username: username.clone(),
            })
            .is_ok()
        });
        if !sent {
            self.shared.jobs().remove(&job_id);
            return Err(SubmitError::ShutDown);
        }

        tracing::info!(job_id = %job_id, username = %username, force_refresh, "job queued");
        Ok(Submission::Queued(status))
    }

    /// Current status of a job, `None` for an unknown id.
    #[must_use]
    pub fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.shared
            .jobs()
            .get(job_id)
            .map(|entry| entry.tx.borrow().clone())
    }

    /// A receiver that observes every subsequent status change of a job.
    #[must_use]
    pub fn subscribe(&self, job_id: &str) -> Option<watch::Receiver<JobStatus>> {
        self.shared.jobs().get(job_id).map(|entry| entry.tx.subscribe())
    }

    /// Stops accepting submissions, lets the workers drain the queue and
    /// waits for them to exit.
    pub async fn shutdown(&self) {
        drop(
            self.queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task ended abnormally");
            }
        }
        tracing::info!("job runner stopped");
    }

    fn sender(&self) -> Option<mpsc::UnboundedSender<QueuedJob>> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Drains the queue, running each job in its own task so a panicking job
/// is marked failed instead of taking the worker down with it.
async fn work<C, S>(worker: usize, shared: Arc<Shared<C, S>>, queue: JobQueue)
where
    C: ActivitySource + 'static,
    S: SnapshotStore + 'static,
{
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        let job_id = job.job_id.clone();
        tracing::debug!(worker, job_id = %job_id, "worker picked up job");

        let task = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move { shared.run(job).await }
        });
        if let Err(e) = task.await {
            tracing::error!(worker, job_id = %job_id, error = %e, "job aborted");
            shared.fail(&job_id, format!("job aborted: {e}"));
        }
    }
    tracing::debug!(worker, "worker exiting");
}
