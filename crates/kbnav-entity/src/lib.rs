//! # kbnav-entity
//!
//! Wire records exchanged with the knowledge-base REST API. Every struct in
//! this crate mirrors a JSON request or response body; all of them derive
//! `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod document;
pub mod envelope;
pub mod folder;
pub mod knowledge_base;

pub use document::{DocumentPage, DocumentRecord};
pub use envelope::ApiEnvelope;
pub use folder::{
    CreateFolderRequest, DeleteFolderResponse, FolderRecord, FolderTreeResponse,
    HasChildrenResponse, UpdateFolderRequest,
};
pub use knowledge_base::KnowledgeBase;
