use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use aussie_core::{MAX_DEPTH, Millis, VPath, now_millis};
use aussie_events::{EventBus, topics};
use aussie_storage::{KvStore, ScopedKvStore};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::bootstrap;
use crate::error::{FsError, FsResult};
use crate::node::{DirEntry, FsNode, FsStat, NodeBody, NodeKind};
use crate::snapshot;

/// Where and for whom a [`FileStore`] is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStoreOptions {
    /// User whose home directory the bootstrap tree contains.
    pub user: String,
    /// Storage namespace holding the snapshot.
    pub namespace: String,
    /// Key of the snapshot blob within the namespace.
    pub key: String,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            namespace: "vfs".to_string(),
            key: "tree".to_string(),
        }
    }
}

struct Inner {
    root: RwLock<FsNode>,
    bus: EventBus,
    kv: ScopedKvStore,
    key: String,
    pending: watch::Sender<Option<Arc<Vec<u8>>>>,
}

/// The virtual file store.
///
/// Cheap to clone; clones share one tree. All tree operations are
/// synchronous and run to completion under a single lock, so no caller can
/// observe a half-applied mutation.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("namespace", &self.inner.kv.namespace())
            .field("key", &self.inner.key)
            .field("nodes", &self.read().node_count())
            .finish_non_exhaustive()
    }
}

impl FileStore {
    /// Open the store, restoring the persisted tree or bootstrapping a new one.
    ///
    /// Spawns the background write-back task, so this must be called from
    /// within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the stored
    /// snapshot is corrupt.
    pub async fn open(
        kv: Arc<dyn KvStore>,
        bus: EventBus,
        options: FileStoreOptions,
    ) -> FsResult<Self> {
        let kv = ScopedKvStore::new(kv, options.namespace)?;
        let (pending, rx) = watch::channel(None);

        let root = match kv.get(&options.key).await? {
            Some(bytes) => {
                let root = snapshot::decode(&bytes)?;
                info!(nodes = root.node_count(), "Restored file tree from snapshot");
                root
            },
            None => {
                let root = bootstrap::default_tree(&options.user, now_millis());
                info!(user = %options.user, "No snapshot found, created default tree");
                // Persist the bootstrap tree so the next open restores it.
                pending.send_replace(Some(Arc::new(snapshot::encode(&root)?)));
                root
            },
        };

        tokio::spawn(write_back(kv.clone(), options.key.clone(), rx));

        Ok(Self {
            inner: Arc::new(Inner {
                root: RwLock::new(root),
                bus,
                kv,
                key: options.key,
                pending,
            }),
        })
    }

    /// Whether `path` resolves to a node. Malformed paths do not exist.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        let Ok(path) = VPath::parse(path) else {
            return false;
        };
        lookup(&self.read(), &path).is_ok()
    }

    /// Read a file's content.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if missing, [`FsError::IsADirectory`] for a directory.
    pub fn read_file(&self, path: &str) -> FsResult<String> {
        let path = VPath::parse(path)?;
        let root = self.read();
        match &lookup(&root, &path)?.body {
            NodeBody::File { content } => Ok(content.clone()),
            NodeBody::Directory { .. } => Err(FsError::IsADirectory(path.to_string())),
        }
    }

    /// Write (or with `append`, extend) a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`FsError::NotADirectory`] if a path component is a file,
    /// [`FsError::IsADirectory`] if the target is a directory.
    pub fn write_file(&self, path: &str, content: &str, append: bool) -> FsResult<()> {
        let path = VPath::parse(path)?;
        let (parent, name) = split(&path)?;

        self.mutate(&[&path], |root, now| {
            let dir = ensure_dir(root, &parent, now)?;
            let Some(children) = dir.children_mut() else {
                return Err(FsError::NotADirectory(parent.to_string()));
            };
            match children.get_mut(name) {
                Some(node) => match &mut node.body {
                    NodeBody::File { content: existing } => {
                        if append {
                            existing.push_str(content);
                        } else {
                            content.clone_into(existing);
                        }
                        node.last_modified = now;
                    },
                    NodeBody::Directory { .. } => {
                        return Err(FsError::IsADirectory(path.to_string()));
                    },
                },
                None => {
                    children.insert(name.to_string(), FsNode::file(name, content, now));
                },
            }
            Ok(true)
        })?;

        debug!(path = %path, bytes = content.len(), append, "Wrote file");
        Ok(())
    }

    /// Create a directory and any missing ancestors. Existing directories
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// [`FsError::NotADirectory`] if any component is a file.
    pub fn mkdir(&self, path: &str) -> FsResult<()> {
        let path = VPath::parse(path)?;
        self.mutate(&[&path], |root, now| {
            ensure_dir(root, &path, now)?;
            Ok(true)
        })?;
        debug!(path = %path, "Created directory");
        Ok(())
    }

    /// List a directory.
    ///
    /// The listing is a detached copy, sorted by name.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] if missing, [`FsError::NotADirectory`] for a file.
    pub fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let path = VPath::parse(path)?;
        let root = self.read();
        let Some(children) = lookup(&root, &path)?.children() else {
            return Err(FsError::NotADirectory(path.to_string()));
        };

        Ok(children
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                path: path.join(name).to_string(),
                kind: node.kind(),
                size: node.size(),
                last_modified: node.last_modified,
            })
            .collect())
    }

    /// Remove a node and its subtree. Absent paths are a silent no-op.
    ///
    /// Deleting `/` empties the root but keeps it.
    ///
    /// # Errors
    ///
    /// Only for malformed paths.
    pub fn delete(&self, path: &str) -> FsResult<()> {
        let path = VPath::parse(path)?;
        let removed = self.mutate(&[&path], |root, now| {
            let Some((parent, name)) = path.parent().zip(path.file_name()) else {
                if let Some(children) = root.children_mut() {
                    children.clear();
                }
                root.last_modified = now;
                return Ok(true);
            };
            let removed = lookup_mut(root, &parent)
                .ok()
                .and_then(FsNode::children_mut)
                .and_then(|children| children.remove(name));
            Ok(removed.is_some())
        })?;

        if removed {
            debug!(path = %path, "Deleted");
        } else {
            trace!(path = %path, "Delete of absent path ignored");
        }
        Ok(())
    }

    /// Relocate a node (with its subtree) to a new path.
    ///
    /// The whole move is validated before anything changes, so a failed
    /// move leaves the tree exactly as it was. Missing parents of the
    /// destination are created.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source is missing
    /// - [`FsError::DestinationExists`] if anything exists at the destination
    /// - [`FsError::NotADirectory`] if a destination ancestor is a file
    /// - [`FsError::InvalidMove`] for the root or a move into its own subtree
    pub fn move_path(&self, from: &str, to: &str) -> FsResult<()> {
        let from = VPath::parse(from)?;
        let to = VPath::parse(to)?;

        self.mutate(&[&from, &to], |root, now| {
            validate_move(root, &from, &to)?;
            commit_move(root, &from, &to, now)?;
            Ok(true)
        })?;

        debug!(from = %from, to = %to, "Moved");
        Ok(())
    }

    /// Metadata for a path.
    ///
    /// # Errors
    ///
    /// [`FsError::NotFound`] or [`FsError::NotADirectory`] during traversal.
    pub fn stat(&self, path: &str) -> FsResult<FsStat> {
        let path = VPath::parse(path)?;
        let root = self.read();
        Ok(FsStat::from(lookup(&root, &path)?))
    }

    /// A detached copy of the whole tree.
    #[must_use]
    pub fn snapshot(&self) -> FsNode {
        self.read().clone()
    }

    /// Persist the current tree now, bypassing background write-back.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub async fn flush(&self) -> FsResult<()> {
        let bytes = snapshot::encode(&self.read())?;
        let len = bytes.len();
        self.inner.kv.set(&self.inner.key, bytes).await?;
        debug!(bytes = len, "Flushed file tree");
        Ok(())
    }

    /// Apply a mutation, queue a snapshot, then emit `file-change` per path.
    ///
    /// `op` returns whether it changed anything; unchanged trees are neither
    /// persisted nor announced.
    fn mutate<F>(&self, paths: &[&VPath], op: F) -> FsResult<bool>
    where
        F: FnOnce(&mut FsNode, Millis) -> FsResult<bool>,
    {
        let changed = {
            let mut root = self.write();
            let changed = op(&mut *root, now_millis())?;
            if changed {
                match snapshot::encode(&root) {
                    Ok(bytes) => {
                        self.inner.pending.send_replace(Some(Arc::new(bytes)));
                    },
                    Err(e) => warn!(error = %e, "Failed to encode file tree snapshot"),
                }
            }
            changed
        };

        if changed {
            for path in paths {
                self.inner.bus.emit_or_log(
                    topics::FILE_CHANGE,
                    serde_json::json!({ "path": path.to_string() }),
                );
            }
        }
        Ok(changed)
    }

    fn read(&self) -> RwLockReadGuard<'_, FsNode> {
        self.inner.root.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FsNode> {
        self.inner.root.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Persist the latest queued snapshot until every sender is gone.
async fn write_back(
    kv: ScopedKvStore,
    key: String,
    mut rx: watch::Receiver<Option<Arc<Vec<u8>>>>,
) {
    while rx.changed().await.is_ok() {
        let Some(bytes) = rx.borrow_and_update().clone() else {
            continue;
        };
        if let Err(e) = kv.set(&key, bytes.to_vec()).await {
            warn!(error = %e, "Failed to persist file tree");
        }
    }
    trace!("File tree write-back stopped");
}

/// Split a non-root path into its parent and final component.
fn split(path: &VPath) -> FsResult<(VPath, &str)> {
    path.parent()
        .zip(path.file_name())
        .ok_or_else(|| FsError::IsADirectory(path.to_string()))
}

fn prefix(path: &VPath, len: usize) -> String {
    let mut out = VPath::root();
    for segment in path.segments().iter().take(len) {
        out = out.join(segment);
    }
    out.to_string()
}

fn lookup<'a>(root: &'a FsNode, path: &VPath) -> FsResult<&'a FsNode> {
    let mut current = root;
    for (depth, name) in path.segments().iter().enumerate() {
        let Some(children) = current.children() else {
            return Err(FsError::NotADirectory(prefix(path, depth)));
        };
        current = children
            .get(name)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
    }
    Ok(current)
}

fn lookup_mut<'a>(root: &'a mut FsNode, path: &VPath) -> FsResult<&'a mut FsNode> {
    let mut current = root;
    for (depth, name) in path.segments().iter().enumerate() {
        let Some(children) = current.children_mut() else {
            return Err(FsError::NotADirectory(prefix(path, depth)));
        };
        current = children
            .get_mut(name)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
    }
    Ok(current)
}

/// Walk to `path`, creating missing directories along the way.
fn ensure_dir<'a>(root: &'a mut FsNode, path: &VPath, now: Millis) -> FsResult<&'a mut FsNode> {
    let mut current = root;
    for (depth, name) in path.segments().iter().enumerate() {
        let Some(children) = current.children_mut() else {
            return Err(FsError::NotADirectory(prefix(path, depth)));
        };
        current = children
            .entry(name.clone())
            .or_insert_with(|| FsNode::directory(name.as_str(), now));
    }
    if current.kind() != NodeKind::Directory {
        return Err(FsError::NotADirectory(path.to_string()));
    }
    Ok(current)
}

/// Check that every existing ancestor of `path` is a directory.
fn check_creatable(root: &FsNode, path: &VPath) -> FsResult<()> {
    let mut current = root;
    for (depth, name) in path.segments().iter().enumerate() {
        let Some(children) = current.children() else {
            return Err(FsError::NotADirectory(prefix(path, depth)));
        };
        match children.get(name) {
            Some(next) => current = next,
            None => return Ok(()),
        }
    }
    if current.kind() == NodeKind::Directory {
        Ok(())
    } else {
        Err(FsError::NotADirectory(path.to_string()))
    }
}

fn validate_move(root: &FsNode, from: &VPath, to: &VPath) -> FsResult<()> {
    if from.is_root() {
        return Err(FsError::InvalidMove("cannot move the root directory".into()));
    }
    lookup(root, from)?;

    match lookup(root, to) {
        Ok(_) => return Err(FsError::DestinationExists(to.to_string())),
        Err(FsError::NotFound(_)) => {},
        Err(e) => return Err(e),
    }

    if to.starts_with(from) {
        return Err(FsError::InvalidMove(format!(
            "cannot move {from} into its own subtree {to}"
        )));
    }

    let deepest = to.depth().saturating_add(lookup(root, from)?.height());
    if deepest > MAX_DEPTH {
        return Err(FsError::InvalidMove(format!(
            "moving {from} to {to} would nest {deepest} levels deep (max {MAX_DEPTH})"
        )));
    }

    let (parent, _) = split(to)?;
    check_creatable(root, &parent)
}

/// Detach the source and attach it at the destination. On an unexpected
/// failure the source is put back where it was.
fn commit_move(root: &mut FsNode, from: &VPath, to: &VPath, now: Millis) -> FsResult<()> {
    let (from_parent, from_name) = split(from)?;
    let (to_parent, to_name) = split(to)?;

    let mut node = lookup_mut(root, &from_parent)?
        .children_mut()
        .and_then(|children| children.remove(from_name))
        .ok_or_else(|| FsError::NotFound(from.to_string()))?;

    let original_modified = node.last_modified;
    node.name = to_name.to_string();
    node.last_modified = now;

    let Err((mut node, e)) = attach(root, &to_parent, node, now) else {
        return Ok(());
    };

    warn!(from = %from, to = %to, error = %e, "Move failed after validation, restoring source");
    node.name = from_name.to_string();
    node.last_modified = original_modified;
    if let Some(children) = lookup_mut(root, &from_parent)
        .ok()
        .and_then(FsNode::children_mut)
    {
        children.insert(node.name.clone(), node);
    }
    Err(e)
}

/// Insert `node` under `parent`, handing it back on failure.
fn attach(
    root: &mut FsNode,
    parent: &VPath,
    node: FsNode,
    now: Millis,
) -> Result<(), (FsNode, FsError)> {
    let dir = match ensure_dir(root, parent, now) {
        Ok(dir) => dir,
        Err(e) => return Err((node, e)),
    };
    dir.insert_child(node)
        .map(|_| ())
        .map_err(|node| (node, FsError::NotADirectory(parent.to_string())))
}
