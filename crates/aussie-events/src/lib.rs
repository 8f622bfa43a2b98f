//! Aussie Events - synchronous event bus for the Aussie web OS core.
//!
//! This crate provides:
//! - The [`Event`] type (`{ type, payload }`)
//! - An [`EventBus`] with global and per-type listeners
//! - Well-known event names in [`topics`]
//!
//! # Architecture
//!
//! Delivery is synchronous and ordered: `emit` invokes every global
//! listener, then every listener registered for that event type, in
//! registration order, before returning. There is no queue and no
//! buffering between emissions.
//!
//! A listener that fails stops delivery and the error is returned to the
//! caller of `emit`. Core components that must not fail use
//! [`EventBus::emit_or_log`] instead.
//!
//! # Example
//!
//! ```rust
//! use aussie_events::{EventBus, topics};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! bus.on(topics::FILE_CHANGE, move |_payload| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! bus.emit(topics::FILE_CHANGE, serde_json::json!({ "path": "/a" })).unwrap();
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod topics;

mod bus;
mod error;
mod event;

pub use bus::{EventBus, ListenerId, Subscription};
pub use error::{EventError, EventResult};
pub use event::Event;
