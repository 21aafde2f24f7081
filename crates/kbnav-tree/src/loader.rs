//! Lazy loading of folder structure and document listings.
//!
//! The loader is stateless: it always fetches. Whether a fetch is needed
//! at all is decided by the [`CacheManager`](crate::cache::CacheManager).

use std::sync::Arc;

use tracing::{debug, warn};

use kbnav_core::error::{AppError, ErrorKind};
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, NodeKey, PageRequest, PageResponse};
use kbnav_entity::FolderRecord;
use kbnav_gateway::EntityGateway;

use crate::node::{DocumentEntity, FolderEntity, Node};

/// Converts the server's nested folder records into folder nodes.
///
/// Recursion follows the `children` arrays already present in the
/// response; nothing here performs I/O. A folder is a leaf exactly when it
/// has no nested folders, whatever documents it holds.
pub fn build_folder_nodes(
    root_id: &KnowledgeBaseId,
    parent_folder_id: Option<&FolderId>,
    records: &[FolderRecord],
) -> Vec<Arc<Node>> {
    records
        .iter()
        .map(|record| {
            let children = build_folder_nodes(root_id, Some(&record.folder_id), record.child_records());
            let entity = FolderEntity::from_record(root_id, parent_folder_id, record);
            Arc::new(Node::folder(entity, children))
        })
        .collect()
}

/// One page of documents for a selected root or folder.
#[derive(Debug, Clone)]
pub struct DocumentListing {
    /// The root or folder the documents belong to.
    pub owner: NodeKey,
    /// Document nodes, pinned first.
    pub items: Vec<Node>,
    /// Page number (1-based).
    pub page: u64,
    /// Page size.
    pub page_size: u64,
    /// Total documents across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl DocumentListing {
    /// Document entities of this page.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentEntity> {
        self.items.iter().filter_map(|node| match node.entity() {
            crate::node::NodeEntity::Document(doc) => Some(doc),
            _ => None,
        })
    }

    /// Whether another page follows.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Fetches subtrees and listings from the entity gateway.
#[derive(Debug, Clone)]
pub struct LazyLoader {
    gateway: Arc<dyn EntityGateway>,
}

impl LazyLoader {
    /// Creates a loader over the given gateway.
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self { gateway }
    }

    /// The gateway the loader fetches from.
    pub fn gateway(&self) -> &Arc<dyn EntityGateway> {
        &self.gateway
    }

    /// Fetches a root's whole folder structure in a single request.
    pub async fn load_root_children(&self, root_id: &KnowledgeBaseId) -> AppResult<Vec<Arc<Node>>> {
        let records = self.gateway.folder_tree(root_id).await.map_err(|e| {
            warn!(root_id = %root_id, error = %e, "Folder tree fetch failed");
            e.reclassify(ErrorKind::FetchFailure)
        })?;

        let nodes = build_folder_nodes(root_id, None, &records);
        debug!(root_id = %root_id, count = nodes.len(), "Folder tree fetched");
        Ok(nodes)
    }

    /// Asks the server whether a container has sub-folders.
    pub async fn probe(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool> {
        self.gateway
            .has_child_folders(root_id, folder_id)
            .await
            .map_err(|e| {
                warn!(root_id = %root_id, folder_id = ?folder_id, error = %e, "Probe failed");
                e.reclassify(ErrorKind::FetchFailure)
            })
    }

    /// Fetches one page of documents under a root or folder.
    ///
    /// Pinned documents are moved to the front; the server's order is kept
    /// otherwise.
    pub async fn load_documents(&self, owner: &NodeKey, page: &PageRequest) -> AppResult<DocumentListing> {
        let (root_id, folder_id) = match owner {
            NodeKey::Root { root_id } => (root_id, None),
            NodeKey::Folder { root_id, folder_id } => (root_id, Some(folder_id)),
            NodeKey::Document { .. } => {
                return Err(AppError::validation(format!(
                    "{owner} is a document and has no document listing"
                )));
            }
        };

        let response: PageResponse<_> = self
            .gateway
            .list_documents(root_id, folder_id, page)
            .await
            .map_err(|e| {
                warn!(key = %owner, error = %e, "Document listing failed");
                e.reclassify(ErrorKind::FetchFailure)
            })?;

        let mut items: Vec<Node> = response
            .items
            .iter()
            .map(|record| Node::document(DocumentEntity::from_record(root_id, folder_id, record)))
            .collect();
        items.sort_by_key(|node| !is_pinned(node));

        debug!(key = %owner, page = response.page, total = response.total_items, "Documents listed");
        Ok(DocumentListing {
            owner: owner.clone(),
            items,
            page: response.page,
            page_size: response.page_size,
            total: response.total_items,
            total_pages: response.total_pages,
        })
    }
}

fn is_pinned(node: &Node) -> bool {
    matches!(node.entity(), crate::node::NodeEntity::Document(doc) if doc.is_pinned)
}
