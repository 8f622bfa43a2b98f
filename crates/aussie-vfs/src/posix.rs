//! POSIX-flavoured view of the file store.
//!
//! Tooling written against a Node-style `fs.promises` surface (version
//! control in particular) expects async calls, `stat` records with a
//! `mode`, and errors tagged with `ENOENT`-style codes. [`PosixFs`]
//! provides exactly that on top of a [`FileStore`] without the store
//! knowing about any of it.
//!
//! Unlike [`FileStore::write_file`] and [`FileStore::mkdir`], the calls
//! here follow POSIX rules: parents are never created implicitly and
//! `mkdir` on an existing path fails with `EEXIST`.

use aussie_core::{ErrorKind, Millis, VPath};
use serde::Serialize;
use thiserror::Error;

use crate::error::FsError;
use crate::node::{FsStat, NodeKind};
use crate::store::FileStore;

/// File type and permission bits for regular files (`-rw-r--r--`).
pub const MODE_FILE: u32 = 0o100_644;
/// File type and permission bits for directories (`drwxr-xr-x`).
pub const MODE_DIR: u32 = 0o040_755;

/// `errno`-style error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosixCode {
    /// No such file or directory.
    Enoent,
    /// Not a directory.
    Enotdir,
    /// Is a directory.
    Eisdir,
    /// File exists.
    Eexist,
    /// Directory not empty.
    Enotempty,
    /// Invalid argument.
    Einval,
    /// I/O error.
    Eio,
}

impl PosixCode {
    /// The conventional code string, e.g. `"ENOENT"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enoent => "ENOENT",
            Self::Enotdir => "ENOTDIR",
            Self::Eisdir => "EISDIR",
            Self::Eexist => "EEXIST",
            Self::Enotempty => "ENOTEMPTY",
            Self::Einval => "EINVAL",
            Self::Eio => "EIO",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Enoent => "no such file or directory",
            Self::Enotdir => "not a directory",
            Self::Eisdir => "illegal operation on a directory",
            Self::Eexist => "file already exists",
            Self::Enotempty => "directory not empty",
            Self::Einval => "invalid argument",
            Self::Eio => "i/o error",
        }
    }
}

impl std::fmt::Display for PosixCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error carrying an `errno`-style code and the offending path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {}, {syscall} '{path}'", code.description())]
pub struct PosixError {
    /// Error code.
    pub code: PosixCode,
    /// Name of the failing call (`"open"`, `"mkdir"`, ...).
    pub syscall: &'static str,
    /// Path passed to the call.
    pub path: String,
}

impl PosixError {
    fn new(code: PosixCode, syscall: &'static str, path: &str) -> Self {
        Self {
            code,
            syscall,
            path: path.to_string(),
        }
    }

    fn from_fs(err: &FsError, syscall: &'static str, path: &str) -> Self {
        let code = match err {
            FsError::NotFound(_) => PosixCode::Enoent,
            FsError::NotADirectory(_) => PosixCode::Enotdir,
            FsError::IsADirectory(_) => PosixCode::Eisdir,
            FsError::DestinationExists(_) => PosixCode::Eexist,
            FsError::InvalidPath(_) | FsError::InvalidMove(_) => PosixCode::Einval,
            FsError::Snapshot(_) | FsError::Storage(_) => PosixCode::Eio,
        };
        Self::new(code, syscall, path)
    }

    /// Error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            PosixCode::Enoent => ErrorKind::NotFound,
            PosixCode::Enotdir => ErrorKind::NotADirectory,
            PosixCode::Eisdir => ErrorKind::IsADirectory,
            PosixCode::Eexist => ErrorKind::DestinationExists,
            PosixCode::Enotempty | PosixCode::Einval => ErrorKind::InvalidInput,
            PosixCode::Eio => ErrorKind::StorageFailure,
        }
    }
}

type PosixResult<T> = Result<T, PosixError>;

/// `stat` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// File type and permission bits.
    pub mode: u32,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Modification time in milliseconds.
    pub mtime_ms: Millis,
    /// Change time; the tree does not track it separately from `mtime_ms`.
    pub ctime_ms: Millis,
}

impl Stats {
    /// Whether this is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.mode & 0o170_000 == 0o100_000
    }

    /// Whether this is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.mode & 0o170_000 == 0o040_000
    }

    /// Always `false`; the tree has no links.
    #[must_use]
    pub fn is_symbolic_link(&self) -> bool {
        false
    }
}

impl From<FsStat> for Stats {
    fn from(stat: FsStat) -> Self {
        Self {
            mode: match stat.kind {
                NodeKind::File => MODE_FILE,
                NodeKind::Directory => MODE_DIR,
            },
            size: stat.size,
            mtime_ms: stat.last_modified,
            ctime_ms: stat.last_modified,
        }
    }
}

/// Async POSIX-style adapter over a [`FileStore`].
#[derive(Debug, Clone)]
pub struct PosixFs {
    store: FileStore,
}

// The methods are async to match the promise-based convention of the
// tooling that consumes them; the underlying store is synchronous.
#[allow(clippy::unused_async)]
impl PosixFs {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// The wrapped store.
    #[must_use]
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// `ENOENT`, `ENOTDIR`, or `EISDIR`.
    pub async fn read_file(&self, path: &str) -> PosixResult<String> {
        self.store
            .read_file(path)
            .map_err(|e| PosixError::from_fs(&e, "open", path))
    }

    /// Create or replace a file. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// `ENOENT` if the parent is missing, `ENOTDIR` or `EISDIR` on kind
    /// mismatches.
    pub async fn write_file(&self, path: &str, data: &str) -> PosixResult<()> {
        self.require_parent_dir(path, "open")?;
        self.store
            .write_file(path, data, false)
            .map_err(|e| PosixError::from_fs(&e, "open", path))
    }

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// `ENOENT` if missing, `EISDIR` for directories.
    pub async fn unlink(&self, path: &str) -> PosixResult<()> {
        let stat = self.stat_raw(path, "unlink")?;
        if stat.kind == NodeKind::Directory {
            return Err(PosixError::new(PosixCode::Eisdir, "unlink", path));
        }
        self.store
            .delete(path)
            .map_err(|e| PosixError::from_fs(&e, "unlink", path))
    }

    /// Names of a directory's entries, sorted.
    ///
    /// # Errors
    ///
    /// `ENOENT` if missing, `ENOTDIR` for files.
    pub async fn readdir(&self, path: &str) -> PosixResult<Vec<String>> {
        let entries = self
            .store
            .read_dir(path)
            .map_err(|e| PosixError::from_fs(&e, "scandir", path))?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Create one directory. The parent must exist.
    ///
    /// # Errors
    ///
    /// `EEXIST` if anything exists at `path`, `ENOENT`/`ENOTDIR` for a bad parent.
    pub async fn mkdir(&self, path: &str) -> PosixResult<()> {
        if self.store.exists(path) {
            return Err(PosixError::new(PosixCode::Eexist, "mkdir", path));
        }
        self.require_parent_dir(path, "mkdir")?;
        self.store
            .mkdir(path)
            .map_err(|e| PosixError::from_fs(&e, "mkdir", path))
    }

    /// Remove an empty directory.
    ///
    /// # Errors
    ///
    /// `ENOENT`, `ENOTDIR` for files, `ENOTEMPTY` when it has entries, and
    /// `EINVAL` for the root.
    pub async fn rmdir(&self, path: &str) -> PosixResult<()> {
        if VPath::parse(path).is_ok_and(|p| p.is_root()) {
            return Err(PosixError::new(PosixCode::Einval, "rmdir", path));
        }
        let entries = self
            .store
            .read_dir(path)
            .map_err(|e| PosixError::from_fs(&e, "rmdir", path))?;
        if !entries.is_empty() {
            return Err(PosixError::new(PosixCode::Enotempty, "rmdir", path));
        }
        self.store
            .delete(path)
            .map_err(|e| PosixError::from_fs(&e, "rmdir", path))
    }

    /// File status.
    ///
    /// # Errors
    ///
    /// `ENOENT` or `ENOTDIR`.
    pub async fn stat(&self, path: &str) -> PosixResult<Stats> {
        self.stat_raw(path, "stat").map(Stats::from)
    }

    /// Same as [`PosixFs::stat`]; the tree has no symbolic links.
    ///
    /// # Errors
    ///
    /// `ENOENT` or `ENOTDIR`.
    pub async fn lstat(&self, path: &str) -> PosixResult<Stats> {
        self.stat_raw(path, "lstat").map(Stats::from)
    }

    /// Whether anything exists at `path`.
    pub async fn exists(&self, path: &str) -> bool {
        self.store.exists(path)
    }

    fn stat_raw(&self, path: &str, syscall: &'static str) -> PosixResult<FsStat> {
        self.store
            .stat(path)
            .map_err(|e| PosixError::from_fs(&e, syscall, path))
    }

    fn require_parent_dir(&self, path: &str, syscall: &'static str) -> PosixResult<()> {
        let parsed = VPath::parse(path)
            .map_err(|_| PosixError::new(PosixCode::Einval, syscall, path))?;
        let Some(parent) = parsed.parent() else {
            return Err(PosixError::new(PosixCode::Eisdir, syscall, path));
        };
        match self.store.stat(&parent.to_string()) {
            Ok(stat) if stat.kind == NodeKind::Directory => Ok(()),
            Ok(_) => Err(PosixError::new(PosixCode::Enotdir, syscall, path)),
            Err(e) => Err(PosixError::from_fs(&e, syscall, path)),
        }
    }
}
