//! Persisted tree layout.
//!
//! Each node is stored as
//! `{ name, kind, content?, lastModified, children?: [[name, node], ...] }`.
//! Children are an ordered list of `[name, node]` pairs rather than a map
//! so the layout stays order-preserving across encoders.

use std::collections::BTreeMap;

use aussie_core::Millis;
use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::node::{FsNode, NodeBody, NodeKind};

/// Wire form of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// Node name.
    pub name: String,
    /// Node kind.
    pub kind: NodeKind,
    /// File content (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Last modification time.
    pub last_modified: Millis,
    /// `[name, node]` pairs (directories only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<(String, SerializedNode)>>,
}

impl From<&FsNode> for SerializedNode {
    fn from(node: &FsNode) -> Self {
        match &node.body {
            NodeBody::File { content } => Self {
                name: node.name.clone(),
                kind: NodeKind::File,
                content: Some(content.clone()),
                last_modified: node.last_modified,
                children: None,
            },
            NodeBody::Directory { children } => Self {
                name: node.name.clone(),
                kind: NodeKind::Directory,
                content: None,
                last_modified: node.last_modified,
                children: Some(
                    children
                        .iter()
                        .map(|(name, child)| (name.clone(), Self::from(child)))
                        .collect(),
                ),
            },
        }
    }
}

impl TryFrom<SerializedNode> for FsNode {
    type Error = FsError;

    fn try_from(raw: SerializedNode) -> FsResult<Self> {
        let body = match raw.kind {
            NodeKind::File => NodeBody::File {
                content: raw.content.unwrap_or_default(),
            },
            NodeKind::Directory => {
                let mut children = BTreeMap::new();
                for (name, child) in raw.children.unwrap_or_default() {
                    if !is_segment(&name) {
                        return Err(FsError::Snapshot(format!(
                            "unaddressable entry '{name}' in directory '{}'",
                            raw.name
                        )));
                    }
                    let mut node = Self::try_from(child)?;
                    // The pair key is authoritative for the child's name.
                    node.name.clone_from(&name);
                    if children.insert(name.clone(), node).is_some() {
                        return Err(FsError::Snapshot(format!(
                            "duplicate entry '{name}' in directory '{}'",
                            raw.name
                        )));
                    }
                }
                NodeBody::Directory { children }
            },
        };

        Ok(Self {
            name: raw.name,
            last_modified: raw.last_modified,
            body,
        })
    }
}

/// A name some normalised path can end in.
fn is_segment(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains('/')
}

/// Serialize a tree to bytes.
///
/// # Errors
///
/// Returns [`FsError::Snapshot`] if JSON encoding fails.
pub fn encode(root: &FsNode) -> FsResult<Vec<u8>> {
    serde_json::to_vec(&SerializedNode::from(root)).map_err(|e| FsError::Snapshot(e.to_string()))
}

/// Deserialize a tree, requiring a directory at the root.
///
/// # Errors
///
/// Returns [`FsError::Snapshot`] if the bytes are not a valid tree.
pub fn decode(bytes: &[u8]) -> FsResult<FsNode> {
    let raw: SerializedNode =
        serde_json::from_slice(bytes).map_err(|e| FsError::Snapshot(e.to_string()))?;
    let root = FsNode::try_from(raw)?;
    if root.kind() != NodeKind::Directory {
        return Err(FsError::Snapshot("root node must be a directory".into()));
    }
    Ok(root)
}
