//! Node entities and the tagged node type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use kbnav_core::types::{DocumentId, FolderId, KnowledgeBaseId, NodeKey, NodeKind};
use kbnav_entity::{DocumentRecord, FolderRecord, KnowledgeBase};

/// A folder as held by the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntity {
    /// Folder identifier.
    pub id: FolderId,
    /// Knowledge base that owns the folder.
    pub owner_root_id: KnowledgeBaseId,
    /// Parent folder, `None` directly under the root.
    pub parent_folder_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
    /// Number of documents directly in the folder.
    pub file_count: u64,
}

impl FolderEntity {
    /// Builds the entity from a server record.
    pub fn from_record(
        owner_root_id: &KnowledgeBaseId,
        parent_folder_id: Option<&FolderId>,
        record: &FolderRecord,
    ) -> Self {
        Self {
            id: record.folder_id.clone(),
            owner_root_id: owner_root_id.clone(),
            parent_folder_id: parent_folder_id.cloned(),
            name: record.folder_name.clone(),
            file_count: record.file_count.unwrap_or(0),
        }
    }
}

/// A document as held by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntity {
    /// Document identifier.
    pub id: DocumentId,
    /// Knowledge base that owns the document.
    pub owner_root_id: KnowledgeBaseId,
    /// Folder holding the document, `None` directly under the root.
    pub folder_id: Option<FolderId>,
    /// Display name.
    pub name: String,
    /// Pinned documents are listed first.
    pub is_pinned: bool,
}

impl DocumentEntity {
    /// Builds the entity from a server record.
    pub fn from_record(
        owner_root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
        record: &DocumentRecord,
    ) -> Self {
        Self {
            id: record.id.clone(),
            owner_root_id: owner_root_id.clone(),
            folder_id: folder_id.cloned(),
            name: record.name.clone(),
            is_pinned: record.is_pinned,
        }
    }
}

/// The record a node wraps, discriminated by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEntity {
    /// A knowledge base.
    Root(KnowledgeBase),
    /// A folder.
    Folder(FolderEntity),
    /// A document.
    Document(DocumentEntity),
}

/// One node of the forest.
///
/// `children == None` means "not loaded yet" and `Some(empty)` means
/// "loaded, nothing below". Nodes are immutable once built; updates
/// produce new nodes and share unchanged children through `Arc`.
#[derive(Debug, Clone)]
pub struct Node {
    key: NodeKey,
    entity: NodeEntity,
    children: Option<Vec<Arc<Node>>>,
    is_leaf: bool,
    load_failed: bool,
}

impl Node {
    /// A root node, not loaded yet. It is expandable unless the listing
    /// said it has no folders.
    pub fn root(kb: KnowledgeBase) -> Self {
        Self {
            key: NodeKey::root(kb.id.clone()),
            is_leaf: kb.has_folders == Some(false),
            entity: NodeEntity::Root(kb),
            children: None,
            load_failed: false,
        }
    }

    /// A folder node with its nested folders resolved.
    pub fn folder(entity: FolderEntity, children: Vec<Arc<Node>>) -> Self {
        Self {
            key: NodeKey::folder(entity.owner_root_id.clone(), entity.id.clone()),
            is_leaf: children.is_empty(),
            entity: NodeEntity::Folder(entity),
            children: Some(children),
            load_failed: false,
        }
    }

    /// A document node; always a leaf.
    pub fn document(entity: DocumentEntity) -> Self {
        Self {
            key: NodeKey::document(entity.owner_root_id.clone(), entity.id.clone()),
            entity: NodeEntity::Document(entity),
            children: None,
            is_leaf: true,
            load_failed: false,
        }
    }

    /// Stable identity of the node.
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Kind of the node.
    pub fn kind(&self) -> NodeKind {
        self.key.kind()
    }

    /// The wrapped record.
    pub fn entity(&self) -> &NodeEntity {
        &self.entity
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match &self.entity {
            NodeEntity::Root(kb) => &kb.name,
            NodeEntity::Folder(folder) => &folder.name,
            NodeEntity::Document(doc) => &doc.name,
        }
    }

    /// Number of documents reported for the node.
    pub fn file_count(&self) -> u64 {
        match &self.entity {
            NodeEntity::Root(kb) => kb.file_count,
            NodeEntity::Folder(folder) => folder.file_count,
            NodeEntity::Document(_) => 0,
        }
    }

    /// Loaded children, `None` if not loaded yet.
    pub fn children(&self) -> Option<&[Arc<Node>]> {
        self.children.as_deref()
    }

    /// Whether the children have been materialized.
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// Whether the node renders without an expand affordance.
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Whether the last load or probe of this node failed.
    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// For roots, what the listing or a probe said about sub-folders.
    pub fn has_folders_hint(&self) -> Option<bool> {
        match &self.entity {
            NodeEntity::Root(kb) => kb.has_folders,
            _ => None,
        }
    }

    /// Copy of the node with `children` materialized.
    pub fn with_children(&self, children: Vec<Arc<Node>>) -> Self {
        Self {
            key: self.key.clone(),
            entity: self.entity.clone(),
            is_leaf: children.is_empty() && self.kind() != NodeKind::Document,
            children: Some(children),
            load_failed: false,
        }
        .fix_document_leaf()
    }

    /// Copy of a root node whose sub-folder hint was probed. Materialized
    /// roots keep their children and leaf state.
    pub fn with_has_folders(&self, has_folders: bool) -> Self {
        let mut next = self.clone();
        if let NodeEntity::Root(kb) = &mut next.entity {
            kb.has_folders = Some(has_folders);
        }
        if next.children.is_none() {
            next.is_leaf = !has_folders;
            next.load_failed = false;
        }
        next
    }

    /// Copy of the node shown as a collapsed leaf after a failed load. The
    /// children stay unloaded so the next expansion retries.
    pub fn as_failed_leaf(&self) -> Self {
        Self {
            key: self.key.clone(),
            entity: self.entity.clone(),
            children: None,
            is_leaf: true,
            load_failed: true,
        }
    }

    /// Copy of the node with another child list, keeping its flags. Used
    /// when a descendant changed but the node itself did not.
    pub(crate) fn with_child_list(&self, children: Option<Vec<Arc<Node>>>) -> Self {
        Self {
            key: self.key.clone(),
            entity: self.entity.clone(),
            children,
            is_leaf: self.is_leaf,
            load_failed: self.load_failed,
        }
    }

    /// Same record, flags, and children by reference.
    pub fn same_as(&self, other: &Node) -> bool {
        self.key == other.key
            && self.entity == other.entity
            && self.is_leaf == other.is_leaf
            && self.load_failed == other.load_failed
            && match (&self.children, &other.children) {
                (None, None) => true,
                (Some(a), Some(b)) => {
                    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
                }
                _ => false,
            }
    }

    fn fix_document_leaf(mut self) -> Self {
        if self.kind() == NodeKind::Document {
            self.children = None;
            self.is_leaf = true;
        }
        self
    }
}
