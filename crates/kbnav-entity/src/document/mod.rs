//! Document entities.

pub mod model;

pub use model::{DocumentPage, DocumentRecord};
