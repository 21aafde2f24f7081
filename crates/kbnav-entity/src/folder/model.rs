//! Folder entity model.

use serde::{Deserialize, Serialize};

use kbnav_core::types::FolderId;

/// A folder as the server describes it, possibly with its nested folders
/// already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Unique folder identifier.
    pub folder_id: FolderId,
    /// Folder name.
    pub folder_name: String,
    /// Parent folder (absent for folders directly under the knowledge base).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<FolderId>,
    /// Number of documents directly in the folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    /// Nested folders, when the response includes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FolderRecord>>,
}

impl FolderRecord {
    /// Create a folder record without children.
    pub fn new(folder_id: impl Into<FolderId>, folder_name: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            folder_name: folder_name.into(),
            parent_folder_id: None,
            file_count: None,
            children: None,
        }
    }

    /// Attach nested folder records.
    pub fn with_children(mut self, children: Vec<FolderRecord>) -> Self {
        self.children = Some(children);
        self
    }

    /// Nested folder records, empty when absent.
    pub fn child_records(&self) -> &[FolderRecord] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /folders/{rootId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Name of the new folder.
    pub folder_name: String,
    /// Parent folder (None to create directly under the knowledge base).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<FolderId>,
}

/// Body of `PUT /folders/{folderId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFolderRequest {
    /// New folder name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
}

/// Data of a successful `DELETE /folders/{folderId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFolderResponse {
    /// Always `true` on success.
    pub deleted: bool,
}
