//! Folder create, rename, and delete.
//!
//! Each mutation runs `Validating → Submitting → Refreshing → Idle`, or
//! ends in `Failed`. Nothing is applied to the forest before the server
//! confirms; afterwards the owning root is refreshed in place. Mutations on
//! the same root are serialized by a per-root lock held for the whole run,
//! while different roots proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use kbnav_core::error::{AppError, ErrorKind};
use kbnav_core::events::{MutationKind, MutationPhase, TreeEventKind};
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, NodeKey, NodeKind};
use kbnav_entity::{CreateFolderRequest, UpdateFolderRequest};
use kbnav_gateway::EntityGateway;

use crate::cache::CacheManager;
use crate::events::EventBus;
use crate::node::{ExpansionSet, Forest};

/// Runs folder mutations and keeps the cache consistent afterwards.
#[derive(Debug)]
pub struct MutationCoordinator {
    cache: Arc<CacheManager>,
    expanded: Arc<RwLock<ExpansionSet>>,
    max_depth: usize,
    busy: DashMap<KnowledgeBaseId, Arc<Mutex<()>>>,
    phases: DashMap<KnowledgeBaseId, MutationPhase>,
    events: EventBus,
}

impl MutationCoordinator {
    /// Creates a coordinator that refreshes through `cache` and keeps
    /// mutated parents in `expanded`.
    pub fn new(
        cache: Arc<CacheManager>,
        expanded: Arc<RwLock<ExpansionSet>>,
        max_depth: usize,
        events: EventBus,
    ) -> Self {
        Self {
            cache,
            expanded,
            max_depth,
            busy: DashMap::new(),
            phases: DashMap::new(),
            events,
        }
    }

    /// Maximum folder depth a new folder may reach.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current phase for a root.
    pub fn phase(&self, root_id: &KnowledgeBaseId) -> MutationPhase {
        self.phases
            .get(root_id)
            .map(|phase| *phase)
            .unwrap_or_default()
    }

    /// Whether a mutation on the root is outstanding.
    pub fn is_busy(&self, root_id: &KnowledgeBaseId) -> bool {
        self.busy
            .get(root_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Forgets all per-root phases.
    pub fn reset(&self) {
        self.phases.clear();
    }

    /// Creates a folder under a root or folder and returns its key.
    ///
    /// Creating under a folder that is already at the maximum depth fails
    /// with `DepthLimitExceeded` before any request is made.
    pub async fn create_folder(&self, parent_key: &NodeKey, name: &str) -> AppResult<NodeKey> {
        let root_id = parent_key.root_id().clone();
        let lock = self.busy_lock(&root_id);
        let _guard = lock.lock().await;
        let kind = MutationKind::Create;

        self.set_phase(&root_id, kind, MutationPhase::Validating);
        let forest = self.cache.snapshot().await;
        let name = match self.validate_create(&forest, parent_key, name) {
            Ok(name) => name,
            Err(e) => return Err(self.fail(&root_id, kind, e)),
        };

        self.set_phase(&root_id, kind, MutationPhase::Submitting);
        let request = CreateFolderRequest {
            folder_name: name.to_string(),
            parent_folder_id: parent_key.folder_id().cloned(),
        };
        let gateway = self.gateway();
        let record = match gateway.create_folder(&root_id, &request).await {
            Ok(record) => record,
            Err(e) => return Err(self.reject(&root_id, kind, e)),
        };
        let key = NodeKey::folder(root_id.clone(), record.folder_id.clone());

        self.set_phase(&root_id, kind, MutationPhase::Refreshing);
        if let Err(e) = self.refresh(&root_id, Some(parent_key)).await {
            return Err(self.fail(&root_id, kind, e));
        }

        self.set_phase(&root_id, kind, MutationPhase::Idle);
        info!(key = %key, parent = %parent_key, name, "Folder created");
        self.events.publish(TreeEventKind::FolderCreated {
            key: key.clone(),
            parent: parent_key.clone(),
        });
        Ok(key)
    }

    /// Renames a folder.
    pub async fn rename_folder(&self, key: &NodeKey, name: &str) -> AppResult<()> {
        let root_id = key.root_id().clone();
        let lock = self.busy_lock(&root_id);
        let _guard = lock.lock().await;
        let kind = MutationKind::Rename;

        self.set_phase(&root_id, kind, MutationPhase::Validating);
        let forest = self.cache.snapshot().await;
        let validated = require_name(name).and_then(|name| {
            let folder_id = require_folder(&forest, key)?;
            Ok((name, folder_id.clone()))
        });
        let (name, folder_id) = match validated {
            Ok(validated) => validated,
            Err(e) => return Err(self.fail(&root_id, kind, e)),
        };
        let parent_key = forest.parent_of(key).map(|parent| parent.key().clone());

        self.set_phase(&root_id, kind, MutationPhase::Submitting);
        let request = UpdateFolderRequest {
            folder_name: Some(name.to_string()),
        };
        if let Err(e) = self.gateway().update_folder(&folder_id, &request).await {
            return Err(self.reject(&root_id, kind, e));
        }

        self.set_phase(&root_id, kind, MutationPhase::Refreshing);
        if let Err(e) = self.refresh(&root_id, parent_key.as_ref()).await {
            return Err(self.fail(&root_id, kind, e));
        }

        self.set_phase(&root_id, kind, MutationPhase::Idle);
        info!(key = %key, name, "Folder renamed");
        self.events.publish(TreeEventKind::FolderRenamed {
            key: key.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Deletes a folder and its subtree.
    ///
    /// The folder, its descendants and their probes are removed from the
    /// cache and the expansion set before the owning root is re-fetched.
    pub async fn delete_folder(&self, key: &NodeKey) -> AppResult<()> {
        let root_id = key.root_id().clone();
        let lock = self.busy_lock(&root_id);
        let _guard = lock.lock().await;
        let kind = MutationKind::Delete;

        self.set_phase(&root_id, kind, MutationPhase::Validating);
        let forest = self.cache.snapshot().await;
        let folder_id = match require_folder(&forest, key) {
            Ok(folder_id) => folder_id.clone(),
            Err(e) => return Err(self.fail(&root_id, kind, e)),
        };
        let parent_key = forest.parent_of(key).map(|parent| parent.key().clone());

        self.set_phase(&root_id, kind, MutationPhase::Submitting);
        if let Err(e) = self.gateway().delete_folder(&folder_id).await {
            return Err(self.reject(&root_id, kind, e));
        }

        self.set_phase(&root_id, kind, MutationPhase::Refreshing);
        let removed = self.cache.remove_node(key).await;
        self.expanded.write().await.remove_all(&removed);
        if let Err(e) = self.refresh(&root_id, parent_key.as_ref()).await {
            return Err(self.fail(&root_id, kind, e));
        }

        self.set_phase(&root_id, kind, MutationPhase::Idle);
        info!(key = %key, removed = removed.len(), "Folder deleted");
        self.events.publish(TreeEventKind::FolderDeleted {
            root_id,
            folder_id,
        });
        Ok(())
    }

    fn validate_create<'a>(&self, forest: &Forest, parent_key: &NodeKey, name: &'a str) -> AppResult<&'a str> {
        let name = require_name(name)?;
        match parent_key.kind() {
            NodeKind::Root => {
                if !forest.contains(parent_key) {
                    return Err(AppError::stale_key(format!("{parent_key} is not in the forest")));
                }
            }
            NodeKind::Folder => {
                let depth = forest
                    .depth_of(parent_key)
                    .ok_or_else(|| AppError::stale_key(format!("{parent_key} is not in the forest")))?;
                if depth >= self.max_depth {
                    return Err(AppError::depth_limit_exceeded(format!(
                        "{parent_key} is at depth {depth}; folders cannot be nested deeper than {}",
                        self.max_depth
                    )));
                }
            }
            NodeKind::Document => {
                return Err(AppError::validation("Folders cannot be created under a document"));
            }
        }
        Ok(name)
    }

    /// Re-fetches the root and keeps `keep_expanded` and its ancestors
    /// expanded so the change is visible.
    async fn refresh(&self, root_id: &KnowledgeBaseId, keep_expanded: Option<&NodeKey>) -> AppResult<()> {
        self.cache.refresh_root(root_id, &self.expanded).await?;
        if let Some(key) = keep_expanded {
            let forest = self.cache.snapshot().await;
            if let Some(chain) = forest.chain(key) {
                let mut expanded = self.expanded.write().await;
                for node in chain {
                    expanded.insert(node.key().clone());
                }
            }
        }
        Ok(())
    }

    fn gateway(&self) -> Arc<dyn EntityGateway> {
        Arc::clone(self.cache.loader().gateway())
    }

    fn busy_lock(&self, root_id: &KnowledgeBaseId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.busy
                .entry(root_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn set_phase(&self, root_id: &KnowledgeBaseId, mutation: MutationKind, phase: MutationPhase) {
        self.phases.insert(root_id.clone(), phase);
        self.events.publish(TreeEventKind::MutationPhaseChanged {
            root_id: root_id.clone(),
            mutation,
            phase,
        });
    }

    fn fail(&self, root_id: &KnowledgeBaseId, mutation: MutationKind, error: AppError) -> AppError {
        warn!(root_id = %root_id, ?mutation, error = %error, "Folder mutation failed");
        self.set_phase(root_id, mutation, MutationPhase::Failed);
        error
    }

    /// Server refusals keep the server's message verbatim.
    fn reject(&self, root_id: &KnowledgeBaseId, mutation: MutationKind, error: AppError) -> AppError {
        self.fail(root_id, mutation, error.reclassify(ErrorKind::MutationRejected))
    }
}

fn require_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Folder name cannot be empty"));
    }
    Ok(name)
}

fn require_folder<'a>(forest: &Forest, key: &'a NodeKey) -> AppResult<&'a FolderId> {
    let folder_id = key
        .folder_id()
        .ok_or_else(|| AppError::validation(format!("{key} is not a folder")))?;
    if !forest.contains(key) {
        return Err(AppError::stale_key(format!("{key} is not in the forest")));
    }
    Ok(folder_id)
}

#[cfg(test)]
mod tests {
    use kbnav_entity::KnowledgeBase;
    use kbnav_gateway::Endpoint;
    use kbnav_gateway::memory::MemoryEntityGateway;

    use super::*;
    use crate::loader::LazyLoader;

    struct Fixture {
        memory: MemoryEntityGateway,
        cache: Arc<CacheManager>,
        expanded: Arc<RwLock<ExpansionSet>>,
        coordinator: MutationCoordinator,
    }

    async fn fixture() -> Fixture {
        let memory = MemoryEntityGateway::builder()
            .knowledge_base(KnowledgeBase::new("r1", "Handbook").with_folders(true))
            .knowledge_base(KnowledgeBase::new("r2", "Policies").with_folders(true))
            .folder("r1", None, "a", "People")
            .folder("r1", Some("a"), "a1", "Onboarding")
            .folder("r1", None, "b", "Finance")
            .folder("r2", None, "x", "Security")
            .build();
        let events = EventBus::new(64);
        let cache = Arc::new(CacheManager::new(
            LazyLoader::new(Arc::new(memory.clone())),
            events.clone(),
        ));
        cache
            .replace_forest(Forest::from_knowledge_bases(vec![
                KnowledgeBase::new("r1", "Handbook").with_folders(true),
                KnowledgeBase::new("r2", "Policies").with_folders(true),
            ]))
            .await;
        cache.ensure_loaded(&"r1".into()).await.unwrap();
        cache.ensure_loaded(&"r2".into()).await.unwrap();
        let expanded = Arc::new(RwLock::new(ExpansionSet::new()));
        let coordinator =
            MutationCoordinator::new(Arc::clone(&cache), Arc::clone(&expanded), 3, events);
        Fixture {
            memory,
            cache,
            expanded,
            coordinator,
        }
    }

    fn folder(root: &str, id: &str) -> NodeKey {
        NodeKey::folder(root.into(), id.into())
    }

    #[tokio::test]
    async fn test_create_refreshes_and_expands_parent() {
        let f = fixture().await;
        let key = f
            .coordinator
            .create_folder(&folder("r1", "a1"), "Benefits")
            .await
            .unwrap();

        let forest = f.cache.snapshot().await;
        assert_eq!(forest.depth_of(&key), Some(2));
        assert!(f.expanded.read().await.contains(&folder("r1", "a1")));
        assert!(f.expanded.read().await.contains(&folder("r1", "a")));
        assert_eq!(f.coordinator.phase(&"r1".into()), MutationPhase::Idle);
        assert_eq!(f.memory.calls().create_folder, 1);
    }

    #[tokio::test]
    async fn test_depth_limit_fails_without_requests() {
        let f = fixture().await;
        let c = f.coordinator.create_folder(&folder("r1", "a1"), "C").await.unwrap();
        let d = f.coordinator.create_folder(&c, "D").await.unwrap();
        f.memory.reset_calls();

        let err = f.coordinator.create_folder(&d, "E").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DepthLimitExceeded);
        assert_eq!(f.memory.calls().total(), 0);
        assert_eq!(f.coordinator.phase(&"r1".into()), MutationPhase::Failed);
    }

    #[tokio::test]
    async fn test_rejection_leaves_forest_untouched() {
        let f = fixture().await;
        let before = f.cache.snapshot().await;

        let err = f
            .coordinator
            .create_folder(&NodeKey::root("r1".into()), "Finance")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::MutationRejected);
        assert_eq!(err.message, "A folder named 'Finance' already exists here");
        let after = f.cache.snapshot().await;
        assert!(Arc::ptr_eq(&before.roots()[0], &after.roots()[0]));
        assert_eq!(f.memory.calls().folder_tree, 2);
    }

    #[tokio::test]
    async fn test_injected_failure_surfaces_message_verbatim() {
        let f = fixture().await;
        f.memory.fail_next(Endpoint::UpdateFolder, "permission denied");
        let err = f
            .coordinator
            .rename_folder(&folder("r1", "b"), "Accounting")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MutationRejected);
        assert_eq!(err.message, "permission denied");
    }

    #[tokio::test]
    async fn test_rename_requires_a_name() {
        let f = fixture().await;
        let err = f
            .coordinator
            .rename_folder(&folder("r1", "b"), "   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(f.memory.calls().update_folder, 0);
    }

    #[tokio::test]
    async fn test_rename_updates_the_node() {
        let f = fixture().await;
        f.coordinator
            .rename_folder(&folder("r1", "b"), "Accounting")
            .await
            .unwrap();
        let forest = f.cache.snapshot().await;
        assert_eq!(
            forest.find_by_key(&folder("r1", "b")).unwrap().name(),
            "Accounting"
        );
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_and_expansion() {
        let f = fixture().await;
        {
            let mut expanded = f.expanded.write().await;
            expanded.insert(folder("r1", "a"));
            expanded.insert(folder("r1", "a1"));
        }
        let r2_before = Arc::clone(&f.cache.snapshot().await.roots()[1]);

        f.coordinator.delete_folder(&folder("r1", "a")).await.unwrap();

        let forest = f.cache.snapshot().await;
        assert!(forest.find_by_key(&folder("r1", "a")).is_none());
        assert!(forest.find_by_key(&folder("r1", "a1")).is_none());
        assert!(!f.expanded.read().await.contains(&folder("r1", "a")));
        assert!(!f.expanded.read().await.contains(&folder("r1", "a1")));
        assert!(Arc::ptr_eq(&forest.roots()[1], &r2_before));
    }

    #[tokio::test]
    async fn test_delete_of_unknown_key_is_stale() {
        let f = fixture().await;
        let err = f
            .coordinator
            .delete_folder(&folder("r1", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StaleKeyReference);
        assert_eq!(f.memory.calls().delete_folder, 0);
    }

    #[tokio::test]
    async fn test_mutations_on_one_root_are_serialized() {
        let f = fixture().await;
        let gate = f.memory.gate_next(Endpoint::CreateFolder);
        let coordinator = &f.coordinator;
        let r1 = NodeKey::root("r1".into());

        let first = coordinator.create_folder(&r1, "Legal");
        let second = async {
            tokio::task::yield_now().await;
            assert!(coordinator.is_busy(&"r1".into()));
            assert!(!coordinator.is_busy(&"r2".into()));
            gate.notify_one();
            coordinator.create_folder(&r1, "Travel").await
        };
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();
        assert!(!coordinator.is_busy(&"r1".into()));
        assert_eq!(f.memory.calls().create_folder, 2);
    }
}
