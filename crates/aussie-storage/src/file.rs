//! Persistent key-value store backed by plain files.
//!
//! Layout: `{root}/{hex(namespace)}/{hex(key)}`. Hex-encoding keeps
//! arbitrary keys safe as file names. Writes go to a sibling temp file
//! which is then renamed over the target, so a reader never observes a
//! half-written value.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{StorageError, StorageResult};
use crate::kv::{KvStore, check_name};

/// On-disk [`KvStore`] rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "Opened file KV store");
        Ok(Self { root })
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(hex::encode(namespace))
    }

    fn key_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(hex::encode(key))
    }
}

/// Map "not found" to `None`, everything else to an error.
fn not_found_as_none<T>(res: std::io::Result<T>) -> StorageResult<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        check_name("namespace", namespace)?;
        check_name("key", key)?;
        not_found_as_none(tokio::fs::read(self.key_path(namespace, key)).await)
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        check_name("namespace", namespace)?;
        check_name("key", key)?;

        let dir = self.namespace_dir(namespace);
        tokio::fs::create_dir_all(&dir).await?;

        let target = self.key_path(namespace, key);
        let tmp = dir.join(format!("{}.tmp", hex::encode(key)));
        tokio::fs::write(&tmp, &value).await?;
        tokio::fs::rename(&tmp, &target).await?;

        trace!(namespace, key, bytes = value.len(), "Wrote value");
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        check_name("namespace", namespace)?;
        check_name("key", key)?;
        let removed = not_found_as_none(tokio::fs::remove_file(self.key_path(namespace, key)).await)?;
        Ok(removed.is_some())
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        check_name("namespace", namespace)?;
        check_name("key", key)?;
        Ok(tokio::fs::try_exists(self.key_path(namespace, key)).await?)
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        check_name("namespace", namespace)?;
        let Some(mut entries) =
            not_found_as_none(tokio::fs::read_dir(self.namespace_dir(namespace)).await)?
        else {
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skip in-flight temp files and anything we did not write.
            let Ok(raw) = hex::decode(name) else { continue };
            if let Ok(key) = String::from_utf8(raw) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        let keys = self.list_keys(namespace).await?;
        let mut removed: u64 = 0;
        for key in keys {
            if self.delete(namespace, &key).await? {
                removed = removed.saturating_add(1);
            }
        }
        Ok(removed)
    }
}
