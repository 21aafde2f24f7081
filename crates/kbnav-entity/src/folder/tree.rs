//! Folder tree responses.

use serde::{Deserialize, Serialize};

use super::model::FolderRecord;

/// Data of `GET /folder-tree/{rootId}`: the nested folder structure of one
/// knowledge base, resolved server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderTreeResponse {
    /// Folders directly under the knowledge base.
    #[serde(default)]
    pub tree: Vec<FolderRecord>,
}

impl FolderTreeResponse {
    /// Total number of folders at every level.
    pub fn total_folders(&self) -> usize {
        fn count(records: &[FolderRecord]) -> usize {
            records
                .iter()
                .map(|r| 1 + count(r.child_records()))
                .sum()
        }
        count(&self.tree)
    }
}

/// Data of `GET /has-children/{rootId}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HasChildrenResponse {
    /// Whether the container has at least one sub-folder.
    pub has_folders: bool,
}
