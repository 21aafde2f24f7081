//! JSON fixtures that seed the in-memory gateway.

use serde::{Deserialize, Serialize};

use kbnav_core::types::FolderId;
use kbnav_entity::{DocumentRecord, KnowledgeBase};

/// A whole server snapshot: knowledge bases with nested folders and
/// documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    /// Knowledge bases in display order.
    #[serde(default)]
    pub knowledge_bases: Vec<FixtureKnowledgeBase>,
}

/// A knowledge base and its content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureKnowledgeBase {
    /// The knowledge base record as listed.
    #[serde(flatten)]
    pub record: KnowledgeBase,
    /// Folders directly under the knowledge base.
    #[serde(default)]
    pub folders: Vec<FixtureFolder>,
    /// Documents directly under the knowledge base.
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

/// A folder with its documents and nested folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFolder {
    /// Folder identifier.
    pub folder_id: FolderId,
    /// Folder name.
    pub folder_name: String,
    /// Documents directly in the folder.
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    /// Nested folders.
    #[serde(default)]
    pub children: Vec<FixtureFolder>,
}
