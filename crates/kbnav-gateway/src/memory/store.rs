//! In-memory entity gateway that models the REST API.
//!
//! Folders are stored as a flat list with parent links, the way the server
//! keeps them, and nested on the way out. Every call is counted per
//! endpoint so callers can assert how many round trips an operation cost.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use kbnav_core::error::AppError;
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, PageRequest, PageResponse};
use kbnav_entity::{
    CreateFolderRequest, DocumentRecord, FolderRecord, KnowledgeBase, UpdateFolderRequest,
};

use super::fixture::{Fixture, FixtureFolder};
use crate::traits::{Endpoint, EntityGateway};

/// First identifier handed out to folders created through the gateway.
const FIRST_GENERATED_ID: u64 = 1000;

/// A folder row.
#[derive(Debug, Clone)]
struct StoredFolder {
    id: FolderId,
    root_id: KnowledgeBaseId,
    parent: Option<FolderId>,
    name: String,
}

/// Documents are keyed by their container.
type Container = (KnowledgeBaseId, Option<FolderId>);

/// Server-side state.
#[derive(Debug)]
struct ServerState {
    bases: Vec<KnowledgeBase>,
    folders: Vec<StoredFolder>,
    documents: HashMap<Container, Vec<DocumentRecord>>,
    next_id: u64,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            bases: Vec::new(),
            folders: Vec::new(),
            documents: HashMap::new(),
            next_id: FIRST_GENERATED_ID,
        }
    }
}

impl ServerState {
    fn require_root(&self, root_id: &KnowledgeBaseId) -> AppResult<()> {
        if self.bases.iter().any(|kb| &kb.id == root_id) {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Knowledge base {root_id} not found"
            )))
        }
    }

    fn folder(&self, folder_id: &FolderId) -> AppResult<&StoredFolder> {
        self.folders
            .iter()
            .find(|f| &f.id == folder_id)
            .ok_or_else(|| AppError::external_service(format!("Folder {folder_id} not found")))
    }

    fn require_folder_in(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<()> {
        self.require_root(root_id)?;
        if let Some(folder_id) = folder_id {
            let folder = self.folder(folder_id)?;
            if &folder.root_id != root_id {
                return Err(AppError::external_service(format!(
                    "Folder {folder_id} does not belong to knowledge base {root_id}"
                )));
            }
        }
        Ok(())
    }

    fn ensure_unique_name(
        &self,
        root_id: &KnowledgeBaseId,
        parent: Option<&FolderId>,
        name: &str,
        except: Option<&FolderId>,
    ) -> AppResult<()> {
        let clash = self.folders.iter().any(|f| {
            &f.root_id == root_id
                && f.parent.as_ref() == parent
                && f.name == name
                && Some(&f.id) != except
        });
        if clash {
            return Err(AppError::external_service(format!(
                "A folder named '{name}' already exists here"
            )));
        }
        Ok(())
    }

    fn file_count(&self, root_id: &KnowledgeBaseId, folder_id: &FolderId) -> u64 {
        self.documents
            .get(&(root_id.clone(), Some(folder_id.clone())))
            .map(|docs| docs.len() as u64)
            .unwrap_or(0)
    }

    /// Builds the nested records under `parent` from the flat folder list.
    fn build_tree(
        &self,
        root_id: &KnowledgeBaseId,
        parent: Option<&FolderId>,
    ) -> Vec<FolderRecord> {
        self.folders
            .iter()
            .filter(|f| &f.root_id == root_id && f.parent.as_ref() == parent)
            .map(|f| FolderRecord {
                folder_id: f.id.clone(),
                folder_name: f.name.clone(),
                parent_folder_id: f.parent.clone(),
                file_count: Some(self.file_count(root_id, &f.id)),
                children: Some(self.build_tree(root_id, Some(&f.id))),
            })
            .collect()
    }

    fn record_of(&self, folder: &StoredFolder) -> FolderRecord {
        FolderRecord {
            folder_id: folder.id.clone(),
            folder_name: folder.name.clone(),
            parent_folder_id: folder.parent.clone(),
            file_count: Some(self.file_count(&folder.root_id, &folder.id)),
            children: None,
        }
    }

    fn descendants_of(&self, folder_id: &FolderId) -> HashSet<FolderId> {
        let mut found = HashSet::from([folder_id.clone()]);
        loop {
            let before = found.len();
            for f in &self.folders {
                if f.parent.as_ref().is_some_and(|p| found.contains(p)) {
                    found.insert(f.id.clone());
                }
            }
            if found.len() == before {
                return found;
            }
        }
    }

    fn insert_fixture_folder(
        &mut self,
        root_id: &KnowledgeBaseId,
        parent: Option<&FolderId>,
        folder: FixtureFolder,
    ) {
        self.folders.push(StoredFolder {
            id: folder.folder_id.clone(),
            root_id: root_id.clone(),
            parent: parent.cloned(),
            name: folder.folder_name,
        });
        if !folder.documents.is_empty() {
            self.documents
                .entry((root_id.clone(), Some(folder.folder_id.clone())))
                .or_default()
                .extend(folder.documents);
        }
        for child in folder.children {
            self.insert_fixture_folder(root_id, Some(&folder.folder_id), child);
        }
    }
}

/// Snapshot of how many times each endpoint was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCalls {
    /// `GET /knowledge-bases`
    pub list_knowledge_bases: u64,
    /// `GET /folder-tree/{rootId}`
    pub folder_tree: u64,
    /// `GET /folders/{rootId}/documents`
    pub list_documents: u64,
    /// `GET /has-children/{rootId}`
    pub has_children: u64,
    /// `POST /folders/{rootId}`
    pub create_folder: u64,
    /// `PUT /folders/{folderId}`
    pub update_folder: u64,
    /// `DELETE /folders/{folderId}`
    pub delete_folder: u64,
}

impl GatewayCalls {
    /// Total calls across all endpoints.
    pub fn total(&self) -> u64 {
        self.list_knowledge_bases
            + self.folder_tree
            + self.list_documents
            + self.has_children
            + self.create_folder
            + self.update_folder
            + self.delete_folder
    }
}

/// In-memory entity gateway.
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntityGateway {
    /// Protected server state.
    state: Arc<Mutex<ServerState>>,
    /// Call counters per endpoint.
    calls: Arc<DashMap<Endpoint, u64>>,
    /// One-shot failures: the next call to the endpoint returns this message.
    faults: Arc<DashMap<Endpoint, String>>,
    /// One-shot gates: the next call to the endpoint waits for a notification.
    gates: Arc<DashMap<Endpoint, Arc<Notify>>>,
    /// One-shot reply holds: the next read answers from the state it saw,
    /// after a notification.
    reply_holds: Arc<DashMap<Endpoint, Arc<Notify>>>,
}

impl MemoryEntityGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a seeded gateway.
    pub fn builder() -> MemoryGatewayBuilder {
        MemoryGatewayBuilder::default()
    }

    /// Creates a gateway seeded from a fixture.
    pub fn from_fixture(fixture: Fixture) -> Self {
        Self::builder().fixture(fixture).build()
    }

    /// Creates a gateway seeded from a JSON fixture file.
    pub fn from_fixture_file(path: &str) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::configuration(format!("Cannot read fixture '{path}': {e}")))?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        info!(
            path,
            knowledge_bases = fixture.knowledge_bases.len(),
            "Loaded gateway fixture"
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Returns the per-endpoint call counts.
    pub fn calls(&self) -> GatewayCalls {
        let get = |endpoint: Endpoint| self.calls.get(&endpoint).map(|c| *c).unwrap_or(0);
        GatewayCalls {
            list_knowledge_bases: get(Endpoint::ListKnowledgeBases),
            folder_tree: get(Endpoint::FolderTree),
            list_documents: get(Endpoint::ListDocuments),
            has_children: get(Endpoint::HasChildren),
            create_folder: get(Endpoint::CreateFolder),
            update_folder: get(Endpoint::UpdateFolder),
            delete_folder: get(Endpoint::DeleteFolder),
        }
    }

    /// Resets all call counters.
    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Makes the next call to `endpoint` fail with an error envelope
    /// carrying `message`.
    pub fn fail_next(&self, endpoint: Endpoint, message: impl Into<String>) {
        self.faults.insert(endpoint, message.into());
    }

    /// Makes the next call to `endpoint` wait until the returned handle is
    /// notified.
    pub fn gate_next(&self, endpoint: Endpoint) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.insert(endpoint, Arc::clone(&notify));
        notify
    }

    /// Makes the next `folder_tree` or `list_documents` call read the server
    /// state, then hold its reply until the returned handle is notified.
    /// Changes made meanwhile are not in that reply.
    pub fn hold_reply_next(&self, endpoint: Endpoint) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.reply_holds.insert(endpoint, Arc::clone(&notify));
        notify
    }

    /// Removes a knowledge base and its content, as another client would.
    pub async fn remove_knowledge_base(&self, root_id: &KnowledgeBaseId) {
        let mut state = self.state.lock().await;
        state.bases.retain(|kb| &kb.id != root_id);
        state.folders.retain(|f| &f.root_id != root_id);
        state.documents.retain(|(root, _), _| root != root_id);
    }

    /// Counts the call, then applies any pending gate or fault.
    async fn enter(&self, endpoint: Endpoint) -> AppResult<()> {
        *self.calls.entry(endpoint).or_insert(0) += 1;

        let gate = self.gates.remove(&endpoint).map(|(_, notify)| notify);
        if let Some(gate) = gate {
            debug!(%endpoint, "Holding gated call");
            gate.notified().await;
        }

        match self.faults.remove(&endpoint) {
            Some((_, message)) => Err(AppError::external_service(message)),
            None => Ok(()),
        }
    }

    /// Waits out a pending reply hold before answering.
    async fn leave(&self, endpoint: Endpoint) {
        let hold = self.reply_holds.remove(&endpoint).map(|(_, notify)| notify);
        if let Some(hold) = hold {
            debug!(%endpoint, "Holding reply");
            hold.notified().await;
        }
    }
}

#[async_trait]
impl EntityGateway for MemoryEntityGateway {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>> {
        self.enter(Endpoint::ListKnowledgeBases).await?;
        let state = self.state.lock().await;
        Ok(state.bases.clone())
    }

    async fn folder_tree(&self, root_id: &KnowledgeBaseId) -> AppResult<Vec<FolderRecord>> {
        self.enter(Endpoint::FolderTree).await?;
        let tree = {
            let state = self.state.lock().await;
            state.require_root(root_id)?;
            state.build_tree(root_id, None)
        };
        self.leave(Endpoint::FolderTree).await;
        Ok(tree)
    }

    async fn list_documents(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentRecord>> {
        self.enter(Endpoint::ListDocuments).await?;
        let state = self.state.lock().await;
        state.require_folder_in(root_id, folder_id)?;

        let all = state
            .documents
            .get(&(root_id.clone(), folder_id.cloned()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let items = all
            .iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();
        let response = PageResponse::new(items, page, all.len() as u64);
        drop(state);
        self.leave(Endpoint::ListDocuments).await;
        Ok(response)
    }

    async fn has_child_folders(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool> {
        self.enter(Endpoint::HasChildren).await?;
        let state = self.state.lock().await;
        state.require_folder_in(root_id, folder_id)?;
        Ok(state
            .folders
            .iter()
            .any(|f| &f.root_id == root_id && f.parent.as_ref() == folder_id))
    }

    async fn create_folder(
        &self,
        root_id: &KnowledgeBaseId,
        request: &CreateFolderRequest,
    ) -> AppResult<FolderRecord> {
        self.enter(Endpoint::CreateFolder).await?;
        let mut state = self.state.lock().await;

        let name = request.folder_name.trim();
        if name.is_empty() {
            return Err(AppError::external_service("Folder name cannot be empty"));
        }
        let parent = request.parent_folder_id.as_ref();
        state.require_folder_in(root_id, parent)?;
        state.ensure_unique_name(root_id, parent, name, None)?;

        let id = FolderId::new(state.next_id.to_string());
        state.next_id += 1;
        let folder = StoredFolder {
            id,
            root_id: root_id.clone(),
            parent: parent.cloned(),
            name: name.to_string(),
        };
        let record = state.record_of(&folder);
        state.folders.push(folder);

        info!(root_id = %root_id, folder_id = %record.folder_id, "Folder created");
        Ok(record)
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: &UpdateFolderRequest,
    ) -> AppResult<FolderRecord> {
        self.enter(Endpoint::UpdateFolder).await?;
        let mut state = self.state.lock().await;

        let current = state.folder(folder_id)?.clone();
        let Some(name) = request.folder_name.as_deref().map(str::trim) else {
            return Ok(state.record_of(&current));
        };
        if name.is_empty() {
            return Err(AppError::external_service("Folder name cannot be empty"));
        }
        state.ensure_unique_name(
            &current.root_id,
            current.parent.as_ref(),
            name,
            Some(folder_id),
        )?;

        let renamed = StoredFolder {
            name: name.to_string(),
            ..current
        };
        let record = state.record_of(&renamed);
        if let Some(slot) = state.folders.iter_mut().find(|f| &f.id == folder_id) {
            *slot = renamed;
        }

        info!(folder_id = %folder_id, name, "Folder renamed");
        Ok(record)
    }

    async fn delete_folder(&self, folder_id: &FolderId) -> AppResult<()> {
        self.enter(Endpoint::DeleteFolder).await?;
        let mut state = self.state.lock().await;

        let root_id = state.folder(folder_id)?.root_id.clone();
        let doomed = state.descendants_of(folder_id);
        state.folders.retain(|f| !doomed.contains(&f.id));
        state.documents.retain(|(root, folder), _| {
            root != &root_id || !folder.as_ref().is_some_and(|f| doomed.contains(f))
        });

        info!(folder_id = %folder_id, removed = doomed.len(), "Folder deleted");
        Ok(())
    }
}

/// Builder that seeds a [`MemoryEntityGateway`].
#[derive(Debug, Default)]
pub struct MemoryGatewayBuilder {
    state: ServerState,
}

impl MemoryGatewayBuilder {
    /// Adds a knowledge base.
    pub fn knowledge_base(mut self, kb: KnowledgeBase) -> Self {
        self.state.bases.push(kb);
        self
    }

    /// Adds a folder under `parent`, or directly under the knowledge base.
    pub fn folder(
        mut self,
        root_id: impl Into<KnowledgeBaseId>,
        parent: Option<&str>,
        folder_id: impl Into<FolderId>,
        name: impl Into<String>,
    ) -> Self {
        self.state.folders.push(StoredFolder {
            id: folder_id.into(),
            root_id: root_id.into(),
            parent: parent.map(FolderId::from),
            name: name.into(),
        });
        self
    }

    /// Adds a document to a folder, or directly under the knowledge base.
    pub fn document(
        mut self,
        root_id: impl Into<KnowledgeBaseId>,
        folder: Option<&str>,
        document: DocumentRecord,
    ) -> Self {
        self.state
            .documents
            .entry((root_id.into(), folder.map(FolderId::from)))
            .or_default()
            .push(document);
        self
    }

    /// Adds everything described by a fixture.
    pub fn fixture(mut self, fixture: Fixture) -> Self {
        for kb in fixture.knowledge_bases {
            let root_id = kb.record.id.clone();
            self.state.bases.push(kb.record);
            if !kb.documents.is_empty() {
                self.state
                    .documents
                    .entry((root_id.clone(), None))
                    .or_default()
                    .extend(kb.documents);
            }
            for folder in kb.folders {
                self.state.insert_fixture_folder(&root_id, None, folder);
            }
        }
        self
    }

    /// Finishes the gateway.
    pub fn build(self) -> MemoryEntityGateway {
        MemoryEntityGateway {
            state: Arc::new(Mutex::new(self.state)),
            ..MemoryEntityGateway::default()
        }
    }
}
