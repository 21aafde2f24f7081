//! Events published by the tree store.
//!
//! A renderer subscribes to these and re-reads the store's snapshots
//! instead of holding its own copy of the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::{FolderId, KnowledgeBaseId};
use crate::types::key::NodeKey;

/// The folder mutation being coordinated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Create a child folder.
    Create,
    /// Rename a folder.
    Rename,
    /// Delete a folder.
    Delete,
}

/// Phase of the per-root mutation state machine.
///
/// `Idle → Validating → Submitting → Refreshing → Idle`, with `Failed`
/// reachable from `Validating` and `Submitting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    /// No mutation in progress.
    #[default]
    Idle,
    /// Client-side checks are running.
    Validating,
    /// The request is on its way to the server.
    Submitting,
    /// The owning root is being re-fetched and patched.
    Refreshing,
    /// The last mutation on this root did not complete.
    Failed,
}

/// Payload of a tree event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEventKind {
    /// The list of knowledge bases was (re)loaded.
    ForestLoaded {
        /// Number of roots in the new forest.
        root_count: usize,
    },
    /// A root's folder subtree was materialized.
    RootLoaded {
        /// The knowledge base.
        root_id: KnowledgeBaseId,
        /// Number of folders directly under the root.
        folder_count: usize,
    },
    /// Loading or probing a root failed; it is now shown as a leaf.
    RootLoadFailed {
        /// The knowledge base.
        root_id: KnowledgeBaseId,
        /// Error message.
        message: String,
    },
    /// A node was expanded.
    Expanded {
        /// The node.
        key: NodeKey,
    },
    /// A node was collapsed.
    Collapsed {
        /// The node.
        key: NodeKey,
    },
    /// The selection changed.
    Selected {
        /// The new selection, if any.
        key: Option<NodeKey>,
    },
    /// A page of documents was listed for the selected node.
    DocumentsLoaded {
        /// The selected node.
        key: NodeKey,
        /// Total documents across all pages.
        total: u64,
    },
    /// The name filter changed.
    SearchChanged {
        /// The new query.
        query: String,
    },
    /// A root's mutation state machine moved to another phase.
    MutationPhaseChanged {
        /// The knowledge base.
        root_id: KnowledgeBaseId,
        /// The mutation.
        mutation: MutationKind,
        /// The new phase.
        phase: MutationPhase,
    },
    /// A folder was created.
    FolderCreated {
        /// The new folder.
        key: NodeKey,
        /// The parent it was created under.
        parent: NodeKey,
    },
    /// A folder was renamed.
    FolderRenamed {
        /// The folder.
        key: NodeKey,
        /// Its new name.
        name: String,
    },
    /// A folder was deleted.
    FolderDeleted {
        /// The knowledge base.
        root_id: KnowledgeBaseId,
        /// The deleted folder.
        folder_id: FolderId,
    },
    /// Keys that no longer exist were dropped from expansion or selection.
    StaleKeysDropped {
        /// The dropped keys.
        keys: Vec<NodeKey>,
    },
}

/// A tree event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub kind: TreeEventKind,
}

impl TreeEvent {
    /// Create a new tree event.
    pub fn new(kind: TreeEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

impl From<TreeEventKind> for TreeEvent {
    fn from(kind: TreeEventKind) -> Self {
        Self::new(kind)
    }
}
