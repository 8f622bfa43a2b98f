//! Storage errors.

use aussie_core::ErrorKind;

/// Why a storage call failed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not read or write.
    #[error("storage backend I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A namespace or key broke the naming rules.
    #[error("invalid {what}: {reason}")]
    InvalidKey {
        /// `"namespace"` or `"key"`.
        what: &'static str,
        /// The rule that was broken.
        reason: String,
    },
}

impl StorageError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::StorageFailure,
            Self::InvalidKey { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Result alias for storage calls.
pub type StorageResult<T> = Result<T, StorageError>;
