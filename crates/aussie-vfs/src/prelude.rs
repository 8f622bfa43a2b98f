//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aussie_vfs::prelude::*;` to import all essential types.

pub use crate::{
    DirEntry, FileStore, FileStoreOptions, FsError, FsNode, FsResult, FsStat, NodeKind, PosixFs,
};
