//! Tree cache configuration.

use serde::{Deserialize, Serialize};

/// Deepest allowed folder depth; a folder directly under its root is at 0.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Settings for the lazy tree cache and its store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum folder depth enforced before a create is submitted.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Page size used when listing the documents of a selected node.
    #[serde(default = "default_page_size")]
    pub document_page_size: u64,
    /// Capacity of the store's event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Probe roots with unknown `has_folders` right after a forest load.
    #[serde(default = "default_true")]
    pub probe_on_load: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            document_page_size: default_page_size(),
            event_buffer: default_event_buffer(),
            probe_on_load: true,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_page_size() -> u64 {
    20
}

fn default_event_buffer() -> usize {
    256
}

fn default_true() -> bool {
    true
}
