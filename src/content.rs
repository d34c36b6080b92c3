//! Shared data model for remote filesystem entries.

use serde::{Deserialize, Serialize};

/// Kind of a remote entry, mirroring the listing protocol's `type` field.
///
/// The remote may report further kinds (symlinks, submodules); those do not
/// deserialize and surface as a schema error at the client boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

/// One remote filesystem entry, identified by its slash-separated path
/// relative to the repository root.
///
/// `content` is attached exactly once, after the raw bytes have been
/// downloaded. Directory nodes never carry content, and every file node
/// returned from [`crate::tree::fetch_tree`] carries it: a failed download
/// fails the whole fetch instead of leaving the field empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNode {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

impl ContentNode {
    /// A file node with its content already resolved.
    pub fn file(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File,
            content: Some(content),
        }
    }

    /// A directory node. Directories are listed, never downloaded.
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Dir,
            content: None,
        }
    }
}
