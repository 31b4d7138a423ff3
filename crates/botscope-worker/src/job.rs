//! Job state as seen by status pollers.

use botscope_core::SnapshotRef;
use serde::Serialize;

/// `queued → started → finished | failed`; `cached` is terminal from birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Started,
    Finished,
    Failed,
    Cached,
}

impl JobState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Started => "started",
            JobState::Finished => "finished",
            JobState::Failed => "failed",
            JobState::Cached => "cached",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed | JobState::Cached)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub username: String,
    pub state: JobState,
    /// Fraction complete in `[0, 1]`; never decreases.
    pub progress: f64,
    pub result: Option<SnapshotRef>,
    pub error: Option<String>,
}

impl JobStatus {
    pub(crate) fn queued(job_id: String, username: String) -> Self {
        Self {
            job_id,
            username,
            state: JobState::Queued,
            progress: 0.0,
            result: None,
            error: None,
        }
    }

    pub(crate) fn cached(snapshot: SnapshotRef) -> Self {
        Self {
            job_id: format!("cached:{}", snapshot.snapshot_id),
            username: snapshot.username.clone(),
            state: JobState::Cached,
            progress: 1.0,
            result: Some(snapshot),
            error: None,
        }
    }

    /// Raises progress to `value`, ignoring attempts to move it backwards.
    pub(crate) fn advance(&mut self, value: f64) {
        self.progress = self.progress.max(value.clamp(0.0, 1.0));
    }
}

/// Outcome of [`crate::JobRunner::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// A fresh snapshot already exists; no work was queued.
    Cached(JobStatus),
    /// A new job was queued.
    Queued(JobStatus),
}

impl Submission {
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.status().job_id
    }

    #[must_use]
    pub fn status(&self) -> &JobStatus {
        match self {
            Submission::Cached(status) | Submission::Queued(status) => status,
        }
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self, Submission::Cached(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn cached_status_uses_snapshot_id() {
        let status = JobStatus::cached(SnapshotRef {
            snapshot_id: 42,
            username: "alice".to_string(),
            collected_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        });
        assert_eq!(status.job_id, "cached:42");
        assert_eq!(status.state, JobState::Cached);
        assert_eq!(status.progress, 1.0);
        assert!(status.state.is_terminal());
    }

    #[test]
    fn progress_never_moves_backwards() {
        let mut status = JobStatus::queued("j".to_string(), "alice".to_string());
        status.advance(0.4);
        status.advance(0.2);
        assert_eq!(status.progress, 0.4);
        status.advance(7.0);
        assert_eq!(status.progress, 1.0);
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobState::Finished).unwrap(),
            "\"finished\""
        );
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Started.is_terminal());
    }
}
