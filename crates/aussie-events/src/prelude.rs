//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{EventBus, ListenerId, Subscription};

// Events
pub use crate::{Event, EventError, EventResult};

// Event names
pub use crate::topics;
