//! Document entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kbnav_core::types::DocumentId;

/// A document inside a folder or directly under a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier.
    #[serde(alias = "document_id")]
    pub id: DocumentId,
    /// Display name.
    #[serde(alias = "document_name")]
    pub name: String,
    /// Pinned documents are listed first.
    #[serde(default)]
    pub is_pinned: bool,
    /// Last modification time, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocumentRecord {
    /// Create an unpinned document record.
    pub fn new(id: impl Into<DocumentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_pinned: false,
            updated_at: None,
        }
    }
}

/// Data of `GET /folders/{rootId}/documents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPage {
    /// Documents on the requested page.
    #[serde(default)]
    pub items: Vec<DocumentRecord>,
    /// Total documents across all pages.
    #[serde(default)]
    pub total: u64,
}
