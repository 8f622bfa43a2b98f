use aussie_core::{ErrorKind, PathError};
use aussie_storage::StorageError;
use thiserror::Error;

/// Virtual filesystem errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Missing file or directory.
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// A path component is a file where a directory was required.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A directory was found where a file was required.
    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// Move target already exists.
    #[error("Destination already exists: {0}")]
    DestinationExists(String),

    /// Malformed path.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// Move that can never succeed (root source, target inside source).
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Persistence backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FsError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::IsADirectory(_) => ErrorKind::IsADirectory,
            Self::DestinationExists(_) => ErrorKind::DestinationExists,
            Self::InvalidPath(_) | Self::InvalidMove(_) => ErrorKind::InvalidInput,
            Self::Snapshot(_) | Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

/// Convenience result type for VFS operations.
pub type FsResult<T> = Result<T, FsError>;
