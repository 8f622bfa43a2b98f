use aussie_core::ErrorKind;
use aussie_vfs::FsError;
use thiserror::Error;

/// Scheduler errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No task with this id.
    #[error("Task not found: {0}")]
    NotFound(String),

    /// Task definition rejected.
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The persisted task list could not be parsed or encoded.
    #[error("Task list serialization error: {0}")]
    Serialization(String),

    /// Reading or writing the task file failed.
    #[error(transparent)]
    Storage(#[from] FsError),
}

impl SchedulerError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidTask(_) => ErrorKind::InvalidInput,
            Self::Serialization(_) => ErrorKind::StorageFailure,
            Self::Storage(e) => e.kind(),
        }
    }
}

/// Convenience result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
