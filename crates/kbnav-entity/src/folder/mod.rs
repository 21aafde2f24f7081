//! Folder entities.

pub mod model;
pub mod tree;

pub use model::{CreateFolderRequest, DeleteFolderResponse, FolderRecord, UpdateFolderRequest};
pub use tree::{FolderTreeResponse, HasChildrenResponse};
