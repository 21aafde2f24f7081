//! Route builders for the knowledge-base REST API.
//!
//! Centralising path construction keeps every URL the gateway touches in
//! one place.

use kbnav_core::types::{FolderId, KnowledgeBaseId};

/// Query value the API expects when a request targets the knowledge base
/// itself rather than a folder.
pub const NULL_FOLDER: &str = "null";

/// `GET /knowledge-bases`
pub fn knowledge_bases(base: &str) -> String {
    format!("{base}/knowledge-bases")
}

/// `GET /folder-tree/{rootId}`
pub fn folder_tree(base: &str, root_id: &KnowledgeBaseId) -> String {
    format!("{base}/folder-tree/{root_id}")
}

/// `GET /folders/{rootId}/documents`
pub fn documents(base: &str, root_id: &KnowledgeBaseId) -> String {
    format!("{base}/folders/{root_id}/documents")
}

/// `GET /has-children/{rootId}`
pub fn has_children(base: &str, root_id: &KnowledgeBaseId) -> String {
    format!("{base}/has-children/{root_id}")
}

/// `POST /folders/{rootId}`
pub fn folders_of(base: &str, root_id: &KnowledgeBaseId) -> String {
    format!("{base}/folders/{root_id}")
}

/// `PUT|DELETE /folders/{folderId}`
pub fn folder(base: &str, folder_id: &FolderId) -> String {
    format!("{base}/folders/{folder_id}")
}

/// The `folder_id` query value for an optional folder.
pub fn folder_param(folder_id: Option<&FolderId>) -> &str {
    folder_id.map(FolderId::as_str).unwrap_or(NULL_FOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let base = "http://kb.local/api";
        let root = KnowledgeBaseId::new("12");
        assert_eq!(folder_tree(base, &root), "http://kb.local/api/folder-tree/12");
        assert_eq!(
            documents(base, &root),
            "http://kb.local/api/folders/12/documents"
        );
        assert_eq!(
            folder(base, &FolderId::new("9")),
            "http://kb.local/api/folders/9"
        );
    }

    #[test]
    fn test_folder_param() {
        assert_eq!(folder_param(None), "null");
        assert_eq!(folder_param(Some(&FolderId::new("4"))), "4");
    }
}
