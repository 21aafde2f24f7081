//! Shared test helpers for integration tests.

use std::sync::Arc;

use kbnav_core::config::tree::TreeConfig;
use kbnav_core::types::NodeKey;
use kbnav_entity::{DocumentRecord, KnowledgeBase};
use kbnav_gateway::memory::MemoryEntityGateway;
use kbnav_tree::TreeStore;

/// Test application context
pub struct TestApp {
    /// Handle on the server model, for call counts and fault injection
    pub gateway: MemoryEntityGateway,
    /// The store under test
    pub store: TreeStore,
}

impl TestApp {
    /// Two knowledge bases:
    ///
    /// ```text
    /// R1 (has_folders = true)
    /// ├── A
    /// │   └── A1
    /// └── B
    /// R2 (has_folders unknown)
    /// └── X
    /// ```
    pub async fn new() -> Self {
        let gateway = MemoryEntityGateway::builder()
            .knowledge_base(KnowledgeBase::new("R1", "Handbook").with_folders(true))
            .knowledge_base(KnowledgeBase::new("R2", "Policies"))
            .folder("R1", None, "A", "People")
            .folder("R1", Some("A"), "A1", "Onboarding")
            .folder("R1", None, "B", "Finance")
            .folder("R2", None, "X", "Security")
            .document("R1", Some("A"), DocumentRecord::new("d1", "Org chart"))
            .build();
        Self::with_gateway(gateway).await
    }

    /// A store over the given gateway, with the forest listed and call
    /// counters reset.
    pub async fn with_gateway(gateway: MemoryEntityGateway) -> Self {
        let store = TreeStore::new(Arc::new(gateway.clone()), &TreeConfig::default());
        store
            .load_forest()
            .await
            .expect("Failed to load forest");
        gateway.reset_calls();
        Self { gateway, store }
    }
}

/// Key of a root.
pub fn root(id: &str) -> NodeKey {
    NodeKey::root(id.into())
}

/// Key of a folder.
pub fn folder(root: &str, id: &str) -> NodeKey {
    NodeKey::folder(root.into(), id.into())
}
