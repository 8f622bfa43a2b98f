//! Error taxonomy shared by every component.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure, independent of the component that raised it.
///
/// Callers use this to tell "permission denied" apart from "would have
/// failed anyway" without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Path or id absent.
    NotFound,
    /// A path component resolved to a file where a directory was required.
    NotADirectory,
    /// A directory was found where a file was required.
    IsADirectory,
    /// Move target already exists.
    DestinationExists,
    /// Capability guard rejection.
    PermissionDenied,
    /// A bounded external call exceeded its deadline.
    Timeout,
    /// Serialization or persistence backend failure.
    StorageFailure,
    /// Malformed input (bad path, bad task definition, bad payload).
    InvalidInput,
    /// The injected command executor could not run the work.
    ExecutionFailed,
}

impl ErrorKind {
    /// Stable string form, used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotADirectory => "not_a_directory",
            Self::IsADirectory => "is_a_directory",
            Self::DestinationExists => "destination_exists",
            Self::PermissionDenied => "permission_denied",
            Self::Timeout => "timeout",
            Self::StorageFailure => "storage_failure",
            Self::InvalidInput => "invalid_input",
            Self::ExecutionFailed => "execution_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while parsing a virtual path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path was not absolute.
    #[error("path must be absolute: {0}")]
    NotAbsolute(String),

    /// `..` would climb above the root.
    #[error("path escapes the root: {0}")]
    EscapesRoot(String),

    /// More components than [`crate::MAX_DEPTH`].
    #[error("path is deeper than {max} components: {path}")]
    TooDeep {
        /// The offending path.
        path: String,
        /// The limit.
        max: usize,
    },
}

impl PathError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}
