//! Cache and invalidation manager.
//!
//! Owns the forest and the two per-root maps: which roots have their
//! folder structure materialized, and memoized "has sub-folders" probes.
//! Both maps are only ever cleared for one root at a time, except when the
//! whole forest is replaced.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use kbnav_core::error::AppError;
use kbnav_core::events::TreeEventKind;
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, NodeKey, NodeKind};

use crate::events::EventBus;
use crate::loader::LazyLoader;
use crate::node::{ExpansionSet, Forest, Node};

/// Key of a memoized probe: a root, or a folder inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeKey {
    /// The knowledge base.
    pub root_id: KnowledgeBaseId,
    /// The folder, `None` for the root itself.
    pub folder_id: Option<FolderId>,
}

impl ProbeKey {
    /// Creates a probe key.
    pub fn new(root_id: KnowledgeBaseId, folder_id: Option<FolderId>) -> Self {
        Self { root_id, folder_id }
    }

    /// The probe key for a root or folder node key.
    pub fn for_node(key: &NodeKey) -> Option<Self> {
        match key {
            NodeKey::Root { root_id } => Some(Self::new(root_id.clone(), None)),
            NodeKey::Folder { root_id, folder_id } => {
                Some(Self::new(root_id.clone(), Some(folder_id.clone())))
            }
            NodeKey::Document { .. } => None,
        }
    }
}

/// Single source of truth for what is loaded.
#[derive(Debug)]
pub struct CacheManager {
    loader: LazyLoader,
    forest: RwLock<Forest>,
    materialized: DashMap<KnowledgeBaseId, bool>,
    probes: DashMap<ProbeKey, bool>,
    load_locks: DashMap<KnowledgeBaseId, Arc<Mutex<()>>>,
    events: EventBus,
}

impl CacheManager {
    /// Creates an empty cache.
    pub fn new(loader: LazyLoader, events: EventBus) -> Self {
        Self {
            loader,
            forest: RwLock::new(Forest::default()),
            materialized: DashMap::new(),
            probes: DashMap::new(),
            load_locks: DashMap::new(),
            events,
        }
    }

    /// The loader used on cache misses.
    pub fn loader(&self) -> &LazyLoader {
        &self.loader
    }

    /// Current forest. Cheap: roots are shared by `Arc`.
    pub async fn snapshot(&self) -> Forest {
        self.forest.read().await.clone()
    }

    /// Applies `f` to the forest under the write lock. `None` from `f`
    /// leaves the forest as it was. Returns whether anything was applied.
    pub async fn apply<F>(&self, f: F) -> bool
    where
        F: FnOnce(&Forest) -> Option<Forest>,
    {
        let mut forest = self.forest.write().await;
        match f(&forest) {
            Some(next) => {
                *forest = next;
                true
            }
            None => false,
        }
    }

    /// Installs a new forest and forgets everything known about the old one.
    pub async fn replace_forest(&self, next: Forest) {
        let mut forest = self.forest.write().await;
        self.materialized.clear();
        self.probes.clear();
        *forest = next;
    }

    /// Drops the forest and both maps.
    pub async fn clear(&self) {
        self.replace_forest(Forest::default()).await;
        self.load_locks.clear();
    }

    /// Whether the root's folder structure is materialized.
    pub fn is_materialized(&self, root_id: &KnowledgeBaseId) -> bool {
        self.materialized.get(root_id).is_some_and(|flag| *flag)
    }

    /// Memoized probe result, if any.
    pub fn cached_probe(&self, key: &ProbeKey) -> Option<bool> {
        self.probes.get(key).map(|flag| *flag)
    }

    /// Number of memoized probes.
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Materializes a root's folder structure unless it already is.
    ///
    /// Concurrent callers for the same root share one fetch. On failure the
    /// root becomes a collapsed leaf and the error is returned as
    /// `FetchFailure`.
    pub async fn ensure_loaded(&self, root_id: &KnowledgeBaseId) -> AppResult<()> {
        if self.is_materialized(root_id) {
            debug!(root_id = %root_id, "Cache hit");
            return Ok(());
        }

        let lock = self.load_lock(root_id);
        let _guard = lock.lock().await;
        if self.is_materialized(root_id) {
            debug!(root_id = %root_id, "Cache filled while waiting");
            return Ok(());
        }

        self.fetch_and_patch(root_id).await
    }

    /// Whether a root or folder has sub-folders, asking the server only on
    /// the first call.
    ///
    /// A root-level answer is also recorded on the unloaded root so that it
    /// renders with the right expandability.
    pub async fn has_children_probe(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool> {
        let key = ProbeKey::new(root_id.clone(), folder_id.cloned());
        if let Some(cached) = self.cached_probe(&key) {
            debug!(root_id = %root_id, folder_id = ?folder_id, cached, "Probe hit");
            return Ok(cached);
        }

        match self.loader.probe(root_id, folder_id).await {
            Ok(has_folders) => {
                self.probes.insert(key, has_folders);
                debug!(root_id = %root_id, folder_id = ?folder_id, has_folders, "Probe memoized");
                if folder_id.is_none() && !self.is_materialized(root_id) {
                    self.apply(|forest| forest.set_root_has_folders(root_id, has_folders))
                        .await;
                }
                Ok(has_folders)
            }
            Err(e) => {
                if folder_id.is_none() && !self.is_materialized(root_id) {
                    let root_key = NodeKey::root(root_id.clone());
                    self.apply(|forest| forest.mark_load_failed(&root_key)).await;
                    self.events.publish(TreeEventKind::RootLoadFailed {
                        root_id: root_id.clone(),
                        message: e.message.clone(),
                    });
                }
                Err(e)
            }
        }
    }

    /// Clears the materialized flag and every probe of one root. The cached
    /// subtree stays in place until the next load replaces it.
    pub fn invalidate_root(&self, root_id: &KnowledgeBaseId) {
        self.materialized.remove(root_id);
        self.probes.retain(|key, _| &key.root_id != root_id);
        debug!(root_id = %root_id, "Root invalidated");
    }

    /// Forgets the probes of the given nodes.
    pub fn forget_probes<'a>(&self, keys: impl IntoIterator<Item = &'a NodeKey>) {
        for key in keys {
            if let Some(probe) = ProbeKey::for_node(key) {
                self.probes.remove(&probe);
            }
        }
    }

    /// Removes a node with its subtree and the probes keyed under it.
    /// Returns the removed keys.
    pub async fn remove_node(&self, key: &NodeKey) -> Vec<NodeKey> {
        let mut forest = self.forest.write().await;
        let removed = forest.subtree_keys(key);
        if let Some(next) = forest.remove(key) {
            *forest = next;
        }
        drop(forest);
        self.forget_probes(&removed);
        removed
    }

    /// Re-fetches one root and patches it in place, then drops expanded
    /// keys of that root that no longer exist. Returns the dropped keys.
    ///
    /// The fetch always happens, even when a load of the root was already
    /// in flight; that load may have read the server before the change.
    ///
    /// Other roots, their cache entries and their expanded keys are not
    /// touched.
    pub async fn refresh_root(
        &self,
        root_id: &KnowledgeBaseId,
        expanded: &RwLock<ExpansionSet>,
    ) -> AppResult<Vec<NodeKey>> {
        {
            let lock = self.load_lock(root_id);
            let _guard = lock.lock().await;
            self.invalidate_root(root_id);
            self.fetch_and_patch(root_id).await?;
        }

        let forest = self.snapshot().await;
        let dropped = expanded.write().await.retain_present(root_id, &forest);
        if !dropped.is_empty() {
            warn!(root_id = %root_id, count = dropped.len(), "Dropped expanded keys that no longer exist");
            self.events.publish(TreeEventKind::StaleKeysDropped {
                keys: dropped.clone(),
            });
        }
        Ok(dropped)
    }

    /// Fetches the root's folder tree and patches it in. The caller holds
    /// the root's load lock.
    async fn fetch_and_patch(&self, root_id: &KnowledgeBaseId) -> AppResult<()> {
        let root_key = NodeKey::root(root_id.clone());
        if !self.forest.read().await.contains(&root_key) {
            return Err(AppError::stale_key(format!("{root_key} is not in the forest")));
        }

        debug!(root_id = %root_id, "Loading folder tree");
        let children = match self.loader.load_root_children(root_id).await {
            Ok(children) => children,
            Err(e) => {
                self.apply(|forest| forest.mark_load_failed(&root_key)).await;
                self.events.publish(TreeEventKind::RootLoadFailed {
                    root_id: root_id.clone(),
                    message: e.message.clone(),
                });
                return Err(e);
            }
        };

        let folder_count = children.len();
        self.remember_structure(root_id, &children);
        let applied = self
            .apply(|forest| forest.patch_children(&root_key, children))
            .await;
        if !applied {
            warn!(root_id = %root_id, "Root disappeared while its folder tree was loading");
            return Err(AppError::stale_key(format!("{root_key} is not in the forest")));
        }

        self.materialized.insert(root_id.clone(), true);
        info!(root_id = %root_id, count = folder_count, "Root materialized");
        self.events.publish(TreeEventKind::RootLoaded {
            root_id: root_id.clone(),
            folder_count,
        });
        Ok(())
    }

    fn load_lock(&self, root_id: &KnowledgeBaseId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.load_locks
                .entry(root_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// A full folder tree answers every probe inside it.
    fn remember_structure(&self, root_id: &KnowledgeBaseId, children: &[Arc<Node>]) {
        self.probes
            .insert(ProbeKey::new(root_id.clone(), None), !children.is_empty());
        let mut stack: Vec<&Arc<Node>> = children.iter().collect();
        while let Some(node) = stack.pop() {
            if node.kind() != NodeKind::Folder {
                continue;
            }
            let nested = node.children().unwrap_or_default();
            if let Some(probe) = ProbeKey::for_node(node.key()) {
                self.probes.insert(probe, !nested.is_empty());
            }
            stack.extend(nested);
        }
    }
}
