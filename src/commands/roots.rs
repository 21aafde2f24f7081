//! `kbnav roots`: list knowledge bases.

use serde::Serialize;
use tabled::Tabled;

use kbnav_core::error::AppError;
use kbnav_tree::TreeStore;

use crate::output::{self, OutputFormat};

/// Knowledge base display row
#[derive(Debug, Serialize, Tabled)]
struct RootRow {
    /// Knowledge base ID
    id: String,
    /// Name
    name: String,
    /// Number of documents
    files: u64,
    /// Whether the tree shows an expand arrow
    expandable: bool,
    /// Sub-folder state as known before loading
    folders: String,
}

/// Execute `roots`
pub async fn execute(store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let forest = store.current_forest().await;
    let rows: Vec<RootRow> = forest
        .roots()
        .iter()
        .map(|root| RootRow {
            id: root.key().root_id().to_string(),
            name: root.name().to_string(),
            files: root.file_count(),
            expandable: !root.is_leaf(),
            folders: match (root.load_failed(), root.has_folders_hint()) {
                (true, _) => "unavailable".to_string(),
                (false, Some(true)) => "yes".to_string(),
                (false, Some(false)) => "no".to_string(),
                (false, None) => "unknown".to_string(),
            },
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}
