//! Stable node keys for the knowledge-base forest.
//!
//! A key is derived from the node kind, its own identifier, and the owning
//! knowledge base, so a re-fetch of the same entity produces an equal key.
//! The kind is a variant, never recovered by inspecting the rendered string.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{DocumentId, FolderId, KnowledgeBaseId};

/// Discriminant of a node in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A knowledge base.
    Root,
    /// A folder nested under a root or another folder.
    Folder,
    /// A document; always a leaf.
    Document,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Folder => write!(f, "folder"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Globally unique identity of a node across the whole forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKey {
    /// Key of a knowledge base.
    Root {
        /// The knowledge base.
        root_id: KnowledgeBaseId,
    },
    /// Key of a folder.
    Folder {
        /// Owning knowledge base.
        root_id: KnowledgeBaseId,
        /// The folder.
        folder_id: FolderId,
    },
    /// Key of a document.
    Document {
        /// Owning knowledge base.
        root_id: KnowledgeBaseId,
        /// The document.
        document_id: DocumentId,
    },
}

impl NodeKey {
    /// Key of a root node.
    pub fn root(root_id: KnowledgeBaseId) -> Self {
        Self::Root { root_id }
    }

    /// Key of a folder node.
    pub fn folder(root_id: KnowledgeBaseId, folder_id: FolderId) -> Self {
        Self::Folder { root_id, folder_id }
    }

    /// Key of a document node.
    pub fn document(root_id: KnowledgeBaseId, document_id: DocumentId) -> Self {
        Self::Document {
            root_id,
            document_id,
        }
    }

    /// The kind of node this key identifies.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Root { .. } => NodeKind::Root,
            Self::Folder { .. } => NodeKind::Folder,
            Self::Document { .. } => NodeKind::Document,
        }
    }

    /// The knowledge base that owns the node.
    pub fn root_id(&self) -> &KnowledgeBaseId {
        match self {
            Self::Root { root_id }
            | Self::Folder { root_id, .. }
            | Self::Document { root_id, .. } => root_id,
        }
    }

    /// The folder identifier, for folder keys.
    pub fn folder_id(&self) -> Option<&FolderId> {
        match self {
            Self::Folder { folder_id, .. } => Some(folder_id),
            _ => None,
        }
    }

    /// Whether the key identifies a knowledge base.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root { .. })
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root { root_id } => write!(f, "kb:{root_id}"),
            Self::Folder { root_id, folder_id } => write!(f, "kb:{root_id}/folder:{folder_id}"),
            Self::Document {
                root_id,
                document_id,
            } => write!(f, "kb:{root_id}/doc:{document_id}"),
        }
    }
}
