//! Core type definitions used across the kbnav workspace.

pub mod id;
pub mod key;
pub mod pagination;

pub use id::*;
pub use key::{NodeKey, NodeKind};
pub use pagination::{PageRequest, PageResponse};
