use aussie_core::ErrorKind;
use thiserror::Error;

/// Window registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// No window with this id.
    #[error("Window not found: {0}")]
    NotFound(String),

    /// Geometry was NaN or infinite.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl WindowError {
    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidGeometry(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Convenience result type for window operations.
pub type WindowResult<T> = Result<T, WindowError>;
