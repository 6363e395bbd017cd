use thiserror::Error;

use crate::domain::JobId;

/// Error type a handler may return. Any `std::error::Error + Send + Sync` converts into it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid construction parameters. The queue is never created.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_concurrency must be at least 1, got {0}")]
    MaxConcurrency(usize),

    #[error("rate_limit_per_second must be a positive finite number, got {0}")]
    RateLimit(f64),

    #[error("retention_ms must be at least {min}ms, got {got}ms")]
    RetentionTooShort { min: u64, got: u64 },

    #[error("max_queue_length must be at least 1, got {0}")]
    MaxQueueLength(usize),

    #[error("invalid queue config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("job queue must be built inside a Tokio runtime")]
    NoRuntime,
}

/// Admission failures. Queue state is unchanged when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("the queue is full, length: {length}")]
    QueueFull { length: usize },

    #[error("job with ID {0} already exists in the queue and will not be added again")]
    DuplicateJob(JobId),

    #[error("the queue has been destroyed")]
    Destroyed,
}

/// Outcome of a single job as seen through [`crate::queue::Completion`].
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {id} failed: {source}")]
    Failed {
        id: JobId,
        #[source]
        source: BoxError,
    },

    #[error("job {id} panicked: {message}")]
    Panicked { id: JobId, message: String },

    #[error("job {0} was dropped from the queue before it ran")]
    Cancelled(JobId),
}

impl JobError {
    /// Id of the job this error belongs to.
    pub fn job_id(&self) -> &JobId {
        match self {
            JobError::Failed { id, .. } => id,
            JobError::Panicked { id, .. } => id,
            JobError::Cancelled(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_messages_name_the_job() {
        let err = QueueError::DuplicateJob(JobId::from("abc"));
        assert!(err.to_string().contains("abc"));

        let err = QueueError::QueueFull { length: 3 };
        assert_eq!(err.to_string(), "the queue is full, length: 3");
    }

    #[test]
    fn job_error_keeps_source() {
        let source: BoxError = "boom".into();
        let err = JobError::Failed {
            id: JobId::from("j1"),
            source,
        };
        assert_eq!(err.job_id().as_str(), "j1");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "job j1 failed: boom");
    }
}
