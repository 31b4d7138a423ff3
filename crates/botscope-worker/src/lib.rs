//! Background analysis jobs for botscope.
//!
//! [`JobRunner`] accepts usernames, answers from the result cache when a
//! fresh snapshot exists, and otherwise runs [`run_pipeline`] on a worker
//! pool while exposing per-job [`JobStatus`] updates.

pub mod error;
pub mod job;
pub mod pipeline;
pub mod result_cache;
pub mod runner;

pub use error::{PipelineError, SubmitError};
pub use job::{JobState, JobStatus, Submission};
pub use pipeline::{run_pipeline, PipelineSettings};
pub use result_cache::ResultCache;
pub use runner::{JobRunner, RunnerConfig};
