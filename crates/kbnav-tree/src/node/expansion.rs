//! The set of expanded node keys.
//!
//! Expansion is view state and lives apart from load state: collapsing a
//! root whose fetch is still in flight does not cancel the fetch, and the
//! fetch completing does not re-expand the root.

use std::collections::BTreeSet;

use kbnav_core::types::{KnowledgeBaseId, NodeKey};

use super::forest::Forest;

/// Ordered set of expanded keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    keys: BTreeSet<NodeKey>,
}

impl ExpansionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key expanded. Returns `false` if it already was.
    pub fn insert(&mut self, key: NodeKey) -> bool {
        self.keys.insert(key)
    }

    /// Marks a key collapsed. Returns `false` if it was not expanded.
    pub fn remove(&mut self, key: &NodeKey) -> bool {
        self.keys.remove(key)
    }

    /// Whether the key is expanded.
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.keys.contains(key)
    }

    /// Expanded keys in key order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeKey> {
        self.keys.iter()
    }

    /// Number of expanded keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Collapses everything.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Copy of the expanded keys.
    pub fn to_vec(&self) -> Vec<NodeKey> {
        self.keys.iter().cloned().collect()
    }

    /// Drops every key of `root_id` that is not present in `forest` and
    /// returns the dropped keys. Other roots' keys are kept as they are.
    pub fn retain_present(&mut self, root_id: &KnowledgeBaseId, forest: &Forest) -> Vec<NodeKey> {
        let stale: Vec<NodeKey> = self
            .keys
            .iter()
            .filter(|key| key.root_id() == root_id && !forest.contains(key))
            .cloned()
            .collect();
        for key in &stale {
            self.keys.remove(key);
        }
        stale
    }

    /// Removes the given keys, returning those that were expanded.
    pub fn remove_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a NodeKey>) -> Vec<NodeKey> {
        keys.into_iter()
            .filter(|key| self.keys.remove(*key))
            .cloned()
            .collect()
    }
}
