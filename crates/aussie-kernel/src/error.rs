use aussie_core::ErrorKind;
use aussie_scheduler::{ExecError, SchedulerError};
use aussie_vfs::FsError;
use aussie_windows::WindowError;
use thiserror::Error;

/// Errors surfaced through the kernel façade and the bridge.
///
/// Guard failures share this channel with the wrapped components' own
/// errors; use [`KernelError::kind`] to tell them apart.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The active policy does not allow the operation.
    #[error("Permission denied: {operation} requires {requirement}")]
    PermissionDenied {
        /// Operation that was attempted.
        operation: &'static str,
        /// Policy setting that would allow it.
        requirement: &'static str,
    },

    /// A bounded call ran past its deadline.
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        /// Operation that was attempted.
        operation: &'static str,
        /// Deadline in milliseconds.
        after_ms: u64,
    },

    /// File store failure.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Window registry failure.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Scheduler failure.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The command executor could not run the command.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A bridge request could not be understood.
    #[error("{0}")]
    InvalidRequest(String),

    /// A result could not be encoded for the wire.
    #[error("Failed to encode result: {0}")]
    Encode(String),
}

impl KernelError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Fs(e) => e.kind(),
            Self::Window(e) => e.kind(),
            Self::Scheduler(e) => e.kind(),
            Self::Exec(ExecError::Unsupported(_)) | Self::InvalidRequest(_) => {
                ErrorKind::InvalidInput
            },
            Self::Exec(ExecError::Failed(_)) => ErrorKind::ExecutionFailed,
            Self::Encode(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn denied(operation: &'static str, requirement: &'static str) -> Self {
        Self::PermissionDenied {
            operation,
            requirement,
        }
    }
}

/// Convenience result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
