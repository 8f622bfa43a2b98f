//! Aussie Windows - the window registry of the Aussie web OS core.
//!
//! Windows here are a lifecycle abstraction, not executing processes. The
//! registry tracks geometry, stacking order and minimise/maximise state,
//! and enforces that at most one window exists per app id: opening an app
//! that already has a window focuses (and if needed restores) it instead.
//!
//! Geometry is always clamped to the viewport minus the configured
//! margins and taskbar. The registry is in-memory only and starts empty.
//!
//! # Example
//!
//! ```rust
//! use aussie_events::EventBus;
//! use aussie_windows::{WindowLayout, WindowRegistry};
//!
//! let registry = WindowRegistry::new(WindowLayout::default(), EventBus::new());
//! let first = registry.open_window("chat", "Chat", None);
//! let second = registry.open_window("chat", "Chat", None);
//!
//! assert_eq!(first.id, second.id);
//! assert_eq!(registry.list_windows().len(), 1);
//! assert!(second.z_index > first.z_index);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod layout;
mod registry;
mod window;

pub use error::{WindowError, WindowResult};
pub use layout::WindowLayout;
pub use registry::{WindowRegistry, WindowSubscription};
pub use window::{Bounds, OsWindow};
