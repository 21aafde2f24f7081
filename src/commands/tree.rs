//! `kbnav tree`: print the folder tree, optionally filtered by name.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use kbnav_core::error::{AppError, ErrorKind};
use kbnav_core::types::NodeKey;
use kbnav_tree::{Node, TreeStore, matching_ancestor_keys};

use crate::output::{self, OutputFormat};

/// Arguments for `tree`
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Only this knowledge base (default: all)
    #[arg(long)]
    pub kb: Option<String>,

    /// Case-insensitive name filter
    #[arg(short, long)]
    pub query: Option<String>,
}

/// Tree display row
#[derive(Debug, Serialize, Tabled)]
struct TreeRow {
    /// Indented name
    name: String,
    /// Node kind
    kind: String,
    /// Folder depth, empty for roots
    depth: String,
    /// Number of documents
    files: u64,
    /// Stable key
    key: String,
}

/// Execute `tree`
pub async fn execute(args: &TreeArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let forest = store.current_forest().await;
    let targets: Vec<NodeKey> = match &args.kb {
        Some(kb) => vec![super::resolve_key(store, kb, None).await?],
        None => forest.roots().iter().map(|root| root.key().clone()).collect(),
    };

    for key in &targets {
        if let Err(e) = store.expand(key).await {
            if !e.is(ErrorKind::FetchFailure) {
                return Err(e);
            }
            output::print_warning(&format!("{key}: {}", e.message));
        }
    }

    if let Some(query) = &args.query {
        store.set_search_query(query).await;
        for key in matching_ancestor_keys(&store.current_forest().await, query) {
            store.expand(&key).await?;
        }
    }

    let visible = store.visible_forest().await;
    let mut rows = Vec::new();
    for root in visible.roots() {
        if targets.contains(root.key()) {
            push_rows(root, 0, &mut rows);
        }
    }

    output::print_list(&rows, format);
    Ok(())
}

fn push_rows(node: &Arc<Node>, level: usize, rows: &mut Vec<TreeRow>) {
    let marker = if node.is_leaf() { "·" } else { "▸" };
    rows.push(TreeRow {
        name: format!("{}{marker} {}", "  ".repeat(level), node.name()),
        kind: node.kind().to_string(),
        depth: level.checked_sub(1).map(|d| d.to_string()).unwrap_or_default(),
        files: node.file_count(),
        key: node.key().to_string(),
    });
    for child in node.children().unwrap_or_default() {
        push_rows(child, level + 1, rows);
    }
}
