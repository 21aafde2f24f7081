//! Gateway manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use kbnav_core::config::gateway::GatewayConfig;
use kbnav_core::error::AppError;
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, PageRequest, PageResponse};
use kbnav_entity::{
    CreateFolderRequest, DocumentRecord, FolderRecord, KnowledgeBase, UpdateFolderRequest,
};

use crate::traits::EntityGateway;

/// Gateway manager that wraps the configured entity gateway.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct GatewayManager {
    /// The inner gateway provider.
    inner: Arc<dyn EntityGateway>,
}

impl GatewayManager {
    /// Create a new gateway manager from configuration.
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let inner: Arc<dyn EntityGateway> = match config.provider.as_str() {
            #[cfg(feature = "http-backend")]
            "http" => {
                info!(base_url = %config.base_url, "Initializing HTTP entity gateway");
                Arc::new(crate::http::HttpEntityGateway::new(config)?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory entity gateway");
                let gateway = match &config.fixture_path {
                    Some(path) => crate::memory::MemoryEntityGateway::from_fixture_file(path)?,
                    None => crate::memory::MemoryEntityGateway::new(),
                };
                Arc::new(gateway)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown gateway provider: '{other}'. Supported: http, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a gateway manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn EntityGateway>) -> Self {
        Self { inner: provider }
    }

    /// Get a shared handle to the inner provider.
    pub fn provider(&self) -> Arc<dyn EntityGateway> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl EntityGateway for GatewayManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>> {
        self.inner.list_knowledge_bases().await
    }

    async fn folder_tree(&self, root_id: &KnowledgeBaseId) -> AppResult<Vec<FolderRecord>> {
        self.inner.folder_tree(root_id).await
    }

    async fn list_documents(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentRecord>> {
        self.inner.list_documents(root_id, folder_id, page).await
    }

    async fn has_child_folders(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool> {
        self.inner.has_child_folders(root_id, folder_id).await
    }

    async fn create_folder(
        &self,
        root_id: &KnowledgeBaseId,
        request: &CreateFolderRequest,
    ) -> AppResult<FolderRecord> {
        self.inner.create_folder(root_id, request).await
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: &UpdateFolderRequest,
    ) -> AppResult<FolderRecord> {
        self.inner.update_folder(folder_id, request).await
    }

    async fn delete_folder(&self, folder_id: &FolderId) -> AppResult<()> {
        self.inner.delete_folder(folder_id).await
    }
}
