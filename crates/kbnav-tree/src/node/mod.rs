//! Node model: the in-memory representation of the forest.

pub mod expansion;
pub mod forest;
pub mod model;

pub use expansion::ExpansionSet;
pub use forest::Forest;
pub use model::{DocumentEntity, FolderEntity, Node, NodeEntity};
