//! # kbnav-tree
//!
//! Client-side cache and index over the server-owned forest of knowledge
//! bases. Roots are listed up front; each root's folder structure is
//! fetched lazily on first expansion, patched in place after folder
//! mutations, and filtered by name without touching the cache.
//!
//! Components follow constructor injection: the gateway and the shared
//! expansion set are provided at construction time via `Arc` references.
//! All writes to the forest go through [`Forest::update_node`], which
//! path-copies the touched branch and shares every other subtree.

pub mod cache;
pub mod events;
pub mod filter;
pub mod loader;
pub mod mutation;
pub mod node;
pub mod store;

pub use cache::{CacheManager, ProbeKey};
pub use events::EventBus;
pub use filter::{breadcrumb, filter, matching_ancestor_keys, path_of};
pub use loader::{DocumentListing, LazyLoader, build_folder_nodes};
pub use mutation::MutationCoordinator;
pub use node::{DocumentEntity, ExpansionSet, FolderEntity, Forest, Node, NodeEntity};
pub use store::TreeStore;
