//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_windows::prelude::*;` to import all essential types.

pub use crate::{OsWindow, WindowError, WindowLayout, WindowRegistry, WindowResult};
