//! The event envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed notification broadcast through the bus. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, e.g. `file-change`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary JSON payload.
    pub payload: Value,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}
