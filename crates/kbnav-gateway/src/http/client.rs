//! HTTP entity gateway using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use kbnav_core::config::gateway::GatewayConfig;
use kbnav_core::error::{AppError, ErrorKind};
use kbnav_core::result::AppResult;
use kbnav_core::types::{FolderId, KnowledgeBaseId, PageRequest, PageResponse};
use kbnav_entity::{
    ApiEnvelope, CreateFolderRequest, DeleteFolderResponse, DocumentPage, DocumentRecord,
    FolderRecord, FolderTreeResponse, HasChildrenResponse, KnowledgeBase, UpdateFolderRequest,
};

use super::routes;
use crate::traits::{Endpoint, EntityGateway};

/// Entity gateway backed by the knowledge-base REST API.
#[derive(Debug, Clone)]
pub struct HttpEntityGateway {
    /// Shared HTTP client (connection pool, timeout, auth header).
    client: Client,
    /// API base URL without trailing slash.
    base_url: String,
}

impl HttpEntityGateway {
    /// Create a new HTTP gateway from configuration.
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AppError::configuration(format!("Invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// The envelope status decides success; the HTTP status code only
    /// matters when the body is not an envelope at all.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("{endpoint} failed: {e}"),
                e,
            )
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("{endpoint} body could not be read: {e}"),
                e,
            )
        })?;

        debug!(%endpoint, status = status.as_u16(), bytes = body.len(), "Gateway response");

        let envelope: ApiEnvelope<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(AppError::transport(format!(
                    "{endpoint} returned HTTP {status}"
                )));
            }
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Serialization,
                    format!("{endpoint} returned an unreadable body: {e}"),
                    e,
                ));
            }
        };

        if !envelope.is_ok() {
            warn!(%endpoint, msg = ?envelope.msg, "Gateway returned error envelope");
        }
        envelope.into_data()
    }
}

#[async_trait]
impl EntityGateway for HttpEntityGateway {
    fn provider_type(&self) -> &str {
        "http"
    }

    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBase>> {
        let url = routes::knowledge_bases(&self.base_url);
        self.send(Endpoint::ListKnowledgeBases, self.client.get(url))
            .await
    }

    async fn folder_tree(&self, root_id: &KnowledgeBaseId) -> AppResult<Vec<FolderRecord>> {
        let url = routes::folder_tree(&self.base_url, root_id);
        let data: FolderTreeResponse = self
            .send(Endpoint::FolderTree, self.client.get(url))
            .await?;
        debug!(root_id = %root_id, folders = data.total_folders(), "Folder tree received");
        Ok(data.tree)
    }

    async fn list_documents(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<DocumentRecord>> {
        let url = routes::documents(&self.base_url, root_id);
        let request = self.client.get(url).query(&[
            ("folder_id", routes::folder_param(folder_id).to_string()),
            ("page", page.page.to_string()),
            ("page_size", page.page_size.to_string()),
        ]);
        let data: DocumentPage = self.send(Endpoint::ListDocuments, request).await?;
        Ok(PageResponse::new(data.items, page, data.total))
    }

    async fn has_child_folders(
        &self,
        root_id: &KnowledgeBaseId,
        folder_id: Option<&FolderId>,
    ) -> AppResult<bool> {
        let url = routes::has_children(&self.base_url, root_id);
        let request = self
            .client
            .get(url)
            .query(&[("folder_id", routes::folder_param(folder_id))]);
        let data: HasChildrenResponse = self.send(Endpoint::HasChildren, request).await?;
        Ok(data.has_folders)
    }

    async fn create_folder(
        &self,
        root_id: &KnowledgeBaseId,
        request: &CreateFolderRequest,
    ) -> AppResult<FolderRecord> {
        let url = routes::folders_of(&self.base_url, root_id);
        self.send(Endpoint::CreateFolder, self.client.post(url).json(request))
            .await
    }

    async fn update_folder(
        &self,
        folder_id: &FolderId,
        request: &UpdateFolderRequest,
    ) -> AppResult<FolderRecord> {
        let url = routes::folder(&self.base_url, folder_id);
        self.send(Endpoint::UpdateFolder, self.client.put(url).json(request))
            .await
    }

    async fn delete_folder(&self, folder_id: &FolderId) -> AppResult<()> {
        let url = routes::folder(&self.base_url, folder_id);
        let data: DeleteFolderResponse = self
            .send(Endpoint::DeleteFolder, self.client.delete(url))
            .await?;
        if data.deleted {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Folder {folder_id} was not deleted"
            )))
        }
    }
}
