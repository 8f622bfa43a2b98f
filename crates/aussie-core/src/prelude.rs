//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_core::prelude::*;` to import all essential types.

pub use crate::{ErrorKind, Millis, PathError, VPath, now_millis};
