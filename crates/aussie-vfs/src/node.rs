use std::collections::BTreeMap;

use aussie_core::Millis;
use serde::{Deserialize, Serialize};

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file holding text content.
    File,
    /// Directory holding named children.
    Directory,
}

/// Kind-specific payload of a node.
///
/// Modelled as an enum so a file can never carry children and a directory
/// always has a (possibly empty) child map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeBody {
    File { content: String },
    Directory { children: BTreeMap<String, FsNode> },
}

/// One entry in the virtual file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsNode {
    pub(crate) name: String,
    pub(crate) last_modified: Millis,
    pub(crate) body: NodeBody,
}

impl FsNode {
    /// Create a file node.
    pub fn file(name: impl Into<String>, content: impl Into<String>, now: Millis) -> Self {
        Self {
            name: name.into(),
            last_modified: now,
            body: NodeBody::File {
                content: content.into(),
            },
        }
    }

    /// Create an empty directory node.
    pub fn directory(name: impl Into<String>, now: Millis) -> Self {
        Self {
            name: name.into(),
            last_modified: now,
            body: NodeBody::Directory {
                children: BTreeMap::new(),
            },
        }
    }

    /// Node name (empty for the root).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::File { .. } => NodeKind::File,
            NodeBody::Directory { .. } => NodeKind::Directory,
        }
    }

    /// Last modification time in milliseconds since the epoch.
    #[must_use]
    pub fn last_modified(&self) -> Millis {
        self.last_modified
    }

    /// File content, or `None` for directories.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Directory { .. } => None,
        }
    }

    /// Children, or `None` for files.
    #[must_use]
    pub fn children(&self) -> Option<&BTreeMap<String, FsNode>> {
        match &self.body {
            NodeBody::File { .. } => None,
            NodeBody::Directory { children } => Some(children),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, FsNode>> {
        match &mut self.body {
            NodeBody::File { .. } => None,
            NodeBody::Directory { children } => Some(children),
        }
    }

    /// Size in bytes for files; directories report zero.
    #[must_use]
    pub fn size(&self) -> u64 {
        match &self.body {
            NodeBody::File { content } => u64::try_from(content.len()).unwrap_or(u64::MAX),
            NodeBody::Directory { .. } => 0,
        }
    }

    /// Insert a child, returning the previous node of that name.
    ///
    /// Returns the child back as `Err` when `self` is a file.
    pub fn insert_child(&mut self, child: FsNode) -> Result<Option<FsNode>, FsNode> {
        match self.children_mut() {
            Some(children) => Ok(children.insert(child.name.clone(), child)),
            None => Err(child),
        }
    }

    /// Count of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.children()
            .map(|c| c.values().map(FsNode::node_count).sum::<usize>())
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Levels below `self`: zero for a file or an empty directory.
    #[must_use]
    pub fn height(&self) -> usize {
        self.children()
            .and_then(|c| c.values().map(|child| child.height().saturating_add(1)).max())
            .unwrap_or(0)
    }
}

/// Metadata for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsStat {
    /// Node kind.
    pub kind: NodeKind,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Last modification time.
    pub last_modified: Millis,
}

impl From<&FsNode> for FsStat {
    fn from(node: &FsNode) -> Self {
        Self {
            kind: node.kind(),
            size: node.size(),
            last_modified: node.last_modified,
        }
    }
}

/// Directory listing entry returned by `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Absolute path of the entry.
    pub path: String,
    /// Node kind.
    pub kind: NodeKind,
    /// Size in bytes (zero for directories).
    pub size: u64,
    /// Last modification time.
    pub last_modified: Millis,
}
