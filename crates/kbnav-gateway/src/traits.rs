//! The entity gateway trait consumed by the tree core.

use std::fmt;

use async_trait::async_trait;

use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, PageRequest, PageResponse};
use kbnav_entity::{
    CreateFolderRequest, DocumentRecord, FolderRecord, KnowledgeBase, UpdateFolderRequest,
};

/// The REST operations of the gateway, used for call accounting and
/// fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /knowledge-bases`
    ListKnowledgeBases,
    /// `GET /folder-tree/{rootId}`
    FolderTree,
    /// `GET /folders/{rootId}/documents`
    ListDocuments,
    /// `GET /has-children/{rootId}`
    HasChildren,
    /// `POST /folders/{rootId}`
    CreateFolder,
    /// `PUT /folders/{folderId}`
    UpdateFolder,
    /// `DELETE /folders/{folderId}`
    DeleteFolder,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListKnowledgeBases => write!(f, "GET /knowledge-bases"),
            Self::FolderTree => write!(f, "GET /folder-tree"),
            Self::ListDocuments => write!(f, "GET /folders/documents"),
            Self::HasChildren => write!(f, "GET /has-children"),
            Self::CreateFolder => write!(f, "POST /folders"),
            Self::UpdateFolder => write!(f, "PUT /folders"),
            Self::DeleteFolder => write!(f, "DELETE /folders"),
        }
    }
}

/// Trait for backends that own knowledge bases, folders, and documents.
///
/// Implementations unwrap the `{ status, data, msg }` envelope and return
/// an error for anything but `status == "ok"`, carrying the server message
/// verbatim. Two implementations are provided:
/// - HTTP (the real REST API)
/// - In-memory (a model of the API with call counters)
#[async_trait]
pub trait EntityGateway: Send + Sync + fmt::Debug + 'static {
    /// Return the provider type identifier (e.g., `"http"`, `"memory"`).
    fn provider_type(&self) -> &str;

    /// List every knowledge base visible to the caller.
    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>>;

    /// Fetch the complete nested folder structure of one knowledge base.
    async fn folder_tree(&self, root_id: &KnowledgeBaseId) -> AppResult<Vec<FolderRecord>>;

    /// List one page of documents directly inside a folder, or directly
    /// under the knowledge base when `folder_id` is `None`.
    async fn list_documents(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentRecord>>;

    /// Whether the container has at least one sub-folder. Documents do not
    /// count.
    async fn has_child_folders(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool>;

    /// Create a folder in the knowledge base.
    async fn create_folder(
        &self,
        root_id: &KnowledgeBaseId,
        request: &CreateFolderRequest,
    ) -> AppResult<FolderRecord>;

    /// Update (rename) a folder.
    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: &UpdateFolderRequest,
    ) -> AppResult<FolderRecord>;

    /// Delete a folder together with everything below it.
    async fn delete_folder(&self, folder_id: &FolderId) -> AppResult<()>;
}
