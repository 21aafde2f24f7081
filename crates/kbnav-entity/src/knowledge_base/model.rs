//! Knowledge base entity model.

use serde::{Deserialize, Serialize};

use kbnav_core::types::KnowledgeBaseId;

/// A knowledge base, the top-level entry of the forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Unique knowledge base identifier.
    pub id: KnowledgeBaseId,
    /// Display name.
    pub name: String,
    /// Number of documents in the knowledge base.
    #[serde(default)]
    pub file_count: u64,
    /// Whether the knowledge base has at least one folder. `None` when the
    /// listing did not say, in which case a probe decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_folders: Option<bool>,
}

impl KnowledgeBase {
    /// Create a knowledge base record.
    pub fn new(id: impl Into<KnowledgeBaseId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            file_count: 0,
            has_folders: None,
        }
    }

    /// Set the `has_folders` flag.
    pub fn with_folders(mut self, has_folders: bool) -> Self {
        self.has_folders = Some(has_folders);
        self
    }
}
