//! Aussie Virtual File Store.
//!
//! An in-memory hierarchical file tree that is the single owner of every
//! node. Callers only ever receive detached copies or primitives.
//!
//! Every mutation:
//! 1. is applied to the tree synchronously,
//! 2. queues a full-tree snapshot for write-back to a [`KvStore`], and
//! 3. emits a `file-change` event on the [`EventBus`].
//!
//! Write-back runs on a background task and only ever persists the latest
//! snapshot. [`FileStore::flush`] writes the current tree immediately.
//!
//! The [`posix`] module exposes the same tree through a POSIX-flavoured
//! async API for tooling written against that convention.
//!
//! [`KvStore`]: aussie_storage::KvStore
//! [`EventBus`]: aussie_events::EventBus

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Default tree created when no snapshot exists.
pub mod bootstrap;
/// Virtual filesystem error types.
pub mod error;
/// Tree node types.
pub mod node;
/// POSIX-flavoured async adapter.
pub mod posix;
pub mod prelude;
/// Snapshot wire format.
pub mod snapshot;
/// The file store itself.
pub mod store;

pub use error::{FsError, FsResult};
pub use node::{DirEntry, FsNode, FsStat, NodeKind};
pub use posix::{PosixCode, PosixError, PosixFs, Stats};
pub use store::{FileStore, FileStoreOptions};
