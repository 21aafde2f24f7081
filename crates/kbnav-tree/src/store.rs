//! Framework-agnostic tree store.
//!
//! The store is the only object a renderer talks to. It exposes the user
//! operations (expand, collapse, select, folder mutations, search) and
//! read-only snapshots, and publishes a [`TreeEvent`] whenever something a
//! renderer shows has changed.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use kbnav_core::config::tree::TreeConfig;
use kbnav_core::error::{AppError, ErrorKind};
use kbnav_core::events::{TreeEvent, TreeEventKind};
use kbnav_core::result::AppResult;
use kbnav_core::types::{NodeKey, NodeKind, PageRequest};
use kbnav_gateway::EntityGateway;

use crate::cache::CacheManager;
use crate::events::EventBus;
use crate::filter;
use crate::loader::{DocumentListing, LazyLoader};
use crate::mutation::MutationCoordinator;
use crate::node::{ExpansionSet, Forest};

/// Selection, search query and the transient document listing.
#[derive(Debug, Default)]
struct ViewState {
    selected: Option<NodeKey>,
    query: String,
    documents: Option<DocumentListing>,
}

/// Lazy tree over the knowledge-base forest.
///
/// Each store owns its own cache; two stores never share state.
#[derive(Debug)]
pub struct TreeStore {
    config: TreeConfig,
    cache: Arc<CacheManager>,
    mutations: MutationCoordinator,
    expanded: Arc<RwLock<ExpansionSet>>,
    view: RwLock<ViewState>,
    events: EventBus,
}

impl TreeStore {
    /// Creates an empty store over `gateway`. Call
    /// [`load_forest`](Self::load_forest) to list the roots.
    pub fn new(gateway: Arc<dyn EntityGateway>, config: &TreeConfig) -> Self {
        let events = EventBus::new(config.event_buffer);
        let cache = Arc::new(CacheManager::new(LazyLoader::new(gateway), events.clone()));
        let expanded = Arc::new(RwLock::new(ExpansionSet::new()));
        let mutations = MutationCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&expanded),
            config.max_depth,
            events.clone(),
        );

        Self {
            config: config.clone(),
            cache,
            mutations,
            expanded,
            view: RwLock::new(ViewState::default()),
            events,
        }
    }

    /// Subscribes to store events.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    /// The cache manager.
    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// The mutation coordinator.
    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    /// Lists the knowledge bases and replaces the forest with fresh,
    /// unloaded roots. Expansion, selection and both caches are reset.
    ///
    /// Roots whose sub-folder state is unknown are probed concurrently
    /// when `probe_on_load` is set; a failed probe only affects its root.
    pub async fn load_forest(&self) -> AppResult<usize> {
        let gateway = Arc::clone(self.cache.loader().gateway());
        let knowledge_bases = gateway.list_knowledge_bases().await.map_err(|e| {
            warn!(error = %e, "Knowledge base listing failed");
            e.reclassify(ErrorKind::FetchFailure)
        })?;

        let forest = Forest::from_knowledge_bases(knowledge_bases);
        let unknown: Vec<_> = forest
            .roots()
            .iter()
            .filter(|root| root.has_folders_hint().is_none())
            .map(|root| root.key().root_id().clone())
            .collect();
        let root_count = forest.roots().len();

        self.cache.replace_forest(forest).await;
        self.expanded.write().await.clear();
        *self.view.write().await = ViewState::default();
        self.mutations.reset();
        info!(count = root_count, "Forest loaded");
        self.events.publish(TreeEventKind::ForestLoaded { root_count });

        if self.config.probe_on_load && !unknown.is_empty() {
            let probes = unknown
                .iter()
                .map(|root_id| self.cache.has_children_probe(root_id, None));
            let failed = join_all(probes)
                .await
                .into_iter()
                .filter(Result::is_err)
                .count();
            debug!(probed = unknown.len(), failed, "Root probes finished");
        }
        Ok(root_count)
    }

    /// Expands a node, loading its root's folder structure on first use.
    ///
    /// A root known to have no folders expands without a request. If the
    /// load fails the node is collapsed again and shown as a leaf.
    pub async fn expand(&self, key: &NodeKey) -> AppResult<()> {
        let forest = self.cache.snapshot().await;
        let node = forest
            .find_by_key(key)
            .ok_or_else(|| AppError::stale_key(format!("{key} is not in the forest")))?;
        if node.kind() == NodeKind::Document {
            return Err(AppError::validation(format!("{key} is a document")));
        }
        let needs_load = node.kind() == NodeKind::Root
            && !self.cache.is_materialized(key.root_id())
            && !(node.has_folders_hint() == Some(false) && !node.load_failed());

        if self.expanded.write().await.insert(key.clone()) {
            self.events.publish(TreeEventKind::Expanded { key: key.clone() });
        }

        if needs_load {
            if let Err(e) = self.cache.ensure_loaded(key.root_id()).await {
                if self.expanded.write().await.remove(key) {
                    self.events.publish(TreeEventKind::Collapsed { key: key.clone() });
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Collapses a node. Loads in flight still complete and are cached.
    pub async fn collapse(&self, key: &NodeKey) -> bool {
        let removed = self.expanded.write().await.remove(key);
        if removed {
            self.events.publish(TreeEventKind::Collapsed { key: key.clone() });
        }
        removed
    }

    /// Selects a root or folder and lists the first page of its documents.
    ///
    /// Documents are fetched on every selection and never cached. Selecting
    /// a key that is no longer in the forest clears the selection and
    /// returns `Ok(None)`.
    pub async fn select(&self, key: &NodeKey) -> AppResult<Option<DocumentListing>> {
        if !self.cache.snapshot().await.contains(key) {
            debug!(key = %key, "Selected key is stale");
            self.drop_selection(key.clone()).await;
            return Ok(None);
        }

        {
            let mut view = self.view.write().await;
            view.selected = Some(key.clone());
            view.documents = None;
        }
        self.events.publish(TreeEventKind::Selected {
            key: Some(key.clone()),
        });

        self.list_documents(key, 1).await.map(Some)
    }

    /// Lists another page of documents for the current selection.
    pub async fn select_page(&self, page: u64) -> AppResult<DocumentListing> {
        let selected = self
            .selected()
            .await
            .ok_or_else(|| AppError::validation("Nothing is selected"))?;
        self.list_documents(&selected, page).await
    }

    /// Clears the selection and its document listing.
    pub async fn clear_selection(&self) {
        let had = {
            let mut view = self.view.write().await;
            view.documents = None;
            view.selected.take().is_some()
        };
        if had {
            self.events.publish(TreeEventKind::Selected { key: None });
        }
    }

    /// Creates a folder under a root or folder and returns its key.
    pub async fn create_folder(&self, parent_key: &NodeKey, name: &str) -> AppResult<NodeKey> {
        let result = self.mutations.create_folder(parent_key, name).await;
        self.reconcile_selection().await;
        result
    }

    /// Renames a folder.
    pub async fn rename_folder(&self, key: &NodeKey, name: &str) -> AppResult<()> {
        let result = self.mutations.rename_folder(key, name).await;
        self.reconcile_selection().await;
        result
    }

    /// Deletes a folder and everything below it.
    pub async fn delete_folder(&self, key: &NodeKey) -> AppResult<()> {
        let result = self.mutations.delete_folder(key).await;
        self.reconcile_selection().await;
        result
    }

    /// Sets the name filter applied by [`visible_forest`](Self::visible_forest).
    pub async fn set_search_query(&self, text: &str) {
        let changed = {
            let mut view = self.view.write().await;
            if view.query == text {
                false
            } else {
                view.query = text.to_string();
                true
            }
        };
        if changed {
            self.events.publish(TreeEventKind::SearchChanged {
                query: text.to_string(),
            });
        }
    }

    /// The current name filter.
    pub async fn search_query(&self) -> String {
        self.view.read().await.query.clone()
    }

    /// The cached forest, unfiltered.
    pub async fn current_forest(&self) -> Forest {
        self.cache.snapshot().await
    }

    /// The cached forest with the current name filter applied.
    pub async fn visible_forest(&self) -> Forest {
        let query = self.search_query().await;
        filter::filter(&self.cache.snapshot().await, &query)
    }

    /// Expanded keys, in key order.
    pub async fn currently_expanded_keys(&self) -> Vec<NodeKey> {
        self.expanded.read().await.to_vec()
    }

    /// Whether a key is expanded.
    pub async fn is_expanded(&self, key: &NodeKey) -> bool {
        self.expanded.read().await.contains(key)
    }

    /// The selected key.
    pub async fn selected(&self) -> Option<NodeKey> {
        self.view.read().await.selected.clone()
    }

    /// The last document listing of the selection.
    pub async fn documents(&self) -> Option<DocumentListing> {
        self.view.read().await.documents.clone()
    }

    /// Whether a root or folder has sub-folders, memoized per store.
    pub async fn probe(&self, key: &NodeKey) -> AppResult<bool> {
        match key {
            NodeKey::Root { root_id } => self.cache.has_children_probe(root_id, None).await,
            NodeKey::Folder { root_id, folder_id } => {
                self.cache
                    .has_children_probe(root_id, Some(folder_id))
                    .await
            }
            NodeKey::Document { .. } => Ok(false),
        }
    }

    /// Drops the forest, both caches and all view state.
    pub async fn dispose(&self) {
        self.cache.clear().await;
        self.expanded.write().await.clear();
        *self.view.write().await = ViewState::default();
        self.mutations.reset();
        debug!("Tree store disposed");
    }

    async fn list_documents(&self, key: &NodeKey, page: u64) -> AppResult<DocumentListing> {
        let request = PageRequest::new(page, self.config.document_page_size);
        let listing = self.cache.loader().load_documents(key, &request).await?;

        let mut view = self.view.write().await;
        if view.selected.as_ref() == Some(key) {
            view.documents = Some(listing.clone());
            drop(view);
            self.events.publish(TreeEventKind::DocumentsLoaded {
                key: key.clone(),
                total: listing.total,
            });
        }
        Ok(listing)
    }

    /// Clears the selection if a refresh removed the selected node.
    async fn reconcile_selection(&self) {
        let Some(selected) = self.selected().await else {
            return;
        };
        if !self.cache.snapshot().await.contains(&selected) {
            self.drop_selection(selected).await;
        }
    }

    async fn drop_selection(&self, stale: NodeKey) {
        let had = {
            let mut view = self.view.write().await;
            view.documents = None;
            view.selected.take().is_some()
        };
        warn!(key = %stale, "Dropped stale selection");
        self.events
            .publish(TreeEventKind::StaleKeysDropped { keys: vec![stale] });
        if had {
            self.events.publish(TreeEventKind::Selected { key: None });
        }
    }
}
