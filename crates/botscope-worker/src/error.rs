use botscope_collector::CollectorError;
use botscope_core::UsernameParseError;
use botscope_db::DbError;
use thiserror::Error;

/// Failure of one pipeline run. Extraction and scoring cannot fail.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("collection failed: {0}")]
    Collector(#[from] CollectorError),
    #[error("persistence failed: {0}")]
    Store(#[from] DbError),
}

/// Rejection of a submission before any work is queued.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    InvalidUsername(#[from] UsernameParseError),
    #[error("job runner is shut down")]
    ShutDown,
}
