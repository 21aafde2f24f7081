//! `kbnav docs`: list the documents of a knowledge base or folder.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use kbnav_core::error::AppError;
use kbnav_tree::TreeStore;

use crate::output::{self, OutputFormat};

/// Arguments for `docs`
#[derive(Debug, Args)]
pub struct DocsArgs {
    /// Knowledge base ID
    #[arg(long)]
    pub kb: String,

    /// Folder ID (omit for documents directly under the knowledge base)
    #[arg(long)]
    pub folder: Option<String>,

    /// Page number
    #[arg(short, long, default_value = "1")]
    pub page: u64,
}

/// Document display row
#[derive(Debug, Serialize, Tabled)]
struct DocumentRow {
    /// Document ID
    id: String,
    /// Name
    name: String,
    /// Pinned to the top
    pinned: bool,
}

/// Execute `docs`
pub async fn execute(args: &DocsArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let key = super::resolve_key(store, &args.kb, args.folder.as_deref()).await?;

    let Some(first) = store.select(&key).await? else {
        return Err(AppError::stale_key(format!("{key} disappeared before it could be listed")));
    };
    let listing = if args.page > 1 {
        store.select_page(args.page).await?
    } else {
        first
    };

    let rows: Vec<DocumentRow> = listing
        .documents()
        .map(|doc| DocumentRow {
            id: doc.id.to_string(),
            name: doc.name.clone(),
            pinned: doc.is_pinned,
        })
        .collect();

    output::print_list(&rows, format);
    if format == OutputFormat::Table {
        println!(
            "Page {} of {} ({} documents)",
            listing.page,
            listing.total_pages.max(1),
            listing.total
        );
    }
    Ok(())
}
