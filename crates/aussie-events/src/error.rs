use thiserror::Error;

/// Errors raised by listeners during delivery.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// A listener rejected the event.
    #[error("listener failed on '{event_type}': {message}")]
    Listener {
        /// Event being delivered.
        event_type: String,
        /// Listener-supplied failure description.
        message: String,
    },
}

impl EventError {
    /// Convenience constructor for listener implementations.
    pub fn listener(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listener {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

/// Result type returned by listeners and `emit`.
pub type EventResult<T> = Result<T, EventError>;
