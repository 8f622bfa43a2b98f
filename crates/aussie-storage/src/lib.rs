//! Aussie Storage - snapshot persistence for the Aussie web OS core.
//!
//! The virtual file store persists its whole tree as one blob under a
//! fixed key. This crate provides the abstract [`KvStore`] it writes to,
//! plus two backends:
//!
//! - [`MemoryKvStore`]: ephemeral, for tests and throwaway sessions
//! - [`FileKvStore`]: one file per key under a data directory
//!
//! Components receive a [`ScopedKvStore`] bound to their own namespace.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod file;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use file::FileKvStore;
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};
