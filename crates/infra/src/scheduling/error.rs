//! Scheduler error types.

use std::time::Duration;

use coverageiq_domain::CoverageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler is not running")]
    NotRunning,

    #[error("shutdown timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    #[error("scheduler task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),

    #[error("reconciliation failed: {0}")]
    Reconciliation(#[from] CoverageError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl From<SchedulerError> for CoverageError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Reconciliation(inner) => inner,
            other => CoverageError::Internal(other.to_string()),
        }
    }
}
