//! The [`KvStore`] seam, the in-memory backend, and [`ScopedKvStore`].
//!
//! Values are opaque bytes addressed by `(namespace, key)`. The file store
//! keeps its whole tree under one key of its own namespace.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::trace;

use crate::error::{StorageError, StorageResult};

/// Longest namespace or key, in bytes.
///
/// [`FileKvStore`](crate::FileKvStore) hex-encodes names into file names,
/// doubling their length; this keeps the result under the common 255-byte
/// file name limit with room for a `.tmp` suffix.
pub const MAX_NAME_LEN: usize = 120;

/// Check a namespace or key (`what` names which, for the error).
pub(crate) fn check_name(what: &'static str, name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidKey {
            what,
            reason: "must not be empty".into(),
        });
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidKey {
            what,
            reason: format!("{} bytes exceeds {MAX_NAME_LEN}", name.len()),
        });
    }
    Ok(())
}

/// Byte storage addressed by namespace and key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// The value under `key`, or `None`.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Remove `key`. Returns whether it was present.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// Whether `key` holds a value.
    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// Keys in `namespace`, sorted.
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;

    /// Remove every key in `namespace`. Returns how many were removed.
    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64>;
}

type Namespaces = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// A [`KvStore`] that lives and dies with the process.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    namespaces: RwLock<Namespaces>,
}

impl MemoryKvStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&Namespaces) -> R) -> R {
        f(&self
            .namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut Namespaces) -> R) -> R {
        f(&mut self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read(|ns| ns.get(namespace).and_then(|keys| keys.get(key)).cloned()))
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        check_name("namespace", namespace)?;
        check_name("key", key)?;
        trace!(namespace, key, bytes = value.len(), "Stored value in memory");
        self.write(|ns| {
            ns.entry(namespace.to_owned())
                .or_default()
                .insert(key.to_owned(), value);
        });
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.write(|ns| {
            let Some(keys) = ns.get_mut(namespace) else {
                return false;
            };
            let removed = keys.remove(key).is_some();
            if keys.is_empty() {
                ns.remove(namespace);
            }
            removed
        }))
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.read(|ns| ns.get(namespace).is_some_and(|keys| keys.contains_key(key))))
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        Ok(self.read(|ns| {
            ns.get(namespace)
                .map(|keys| keys.keys().cloned().collect())
                .unwrap_or_default()
        }))
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        let removed = self.write(|ns| ns.remove(namespace).map_or(0, |keys| keys.len()));
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

/// A [`KvStore`] with the namespace fixed, as handed to one component.
///
/// ```rust
/// use std::sync::Arc;
/// use aussie_storage::{MemoryKvStore, ScopedKvStore};
///
/// # async fn demo() -> aussie_storage::StorageResult<()> {
/// let vfs = ScopedKvStore::new(Arc::new(MemoryKvStore::new()), "vfs")?;
/// vfs.set("tree", b"{}".to_vec()).await?;
/// assert!(vfs.exists("tree").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScopedKvStore {
    store: Arc<dyn KvStore>,
    namespace: String,
}

impl std::fmt::Debug for ScopedKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedKvStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl ScopedKvStore {
    /// Bind `store` to `namespace`.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidKey`] for an empty or overlong namespace.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> StorageResult<Self> {
        let namespace = namespace.into();
        check_name("namespace", &namespace)?;
        Ok(Self { store, namespace })
    }

    /// The bound namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// See [`KvStore::get`].
    ///
    /// # Errors
    ///
    /// Backend failures and invalid keys.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        check_name("key", key)?;
        self.store.get(&self.namespace, key).await
    }

    /// See [`KvStore::set`].
    ///
    /// # Errors
    ///
    /// Backend failures and invalid keys.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.store.set(&self.namespace, key, value).await
    }

    /// See [`KvStore::delete`].
    ///
    /// # Errors
    ///
    /// Backend failures and invalid keys.
    pub async fn delete(&self, key: &str) -> StorageResult<bool> {
        check_name("key", key)?;
        self.store.delete(&self.namespace, key).await
    }

    /// See [`KvStore::exists`].
    ///
    /// # Errors
    ///
    /// Backend failures and invalid keys.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        check_name("key", key)?;
        self.store.exists(&self.namespace, key).await
    }
}
