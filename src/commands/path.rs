//! `kbnav path`: print a folder's breadcrumb.

use clap::Args;
use serde::Serialize;

use kbnav_core::error::AppError;
use kbnav_tree::{TreeStore, path_of};

use crate::output::{self, OutputFormat};

/// Arguments for `path`
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Knowledge base ID
    #[arg(long)]
    pub kb: String,
    /// Folder ID
    #[arg(long)]
    pub folder: String,
}

/// Breadcrumb of one folder
#[derive(Debug, Serialize)]
struct PathOutcome {
    /// Names from the knowledge base down to the folder
    segments: Vec<String>,
    /// Folder depth; 0 directly under the knowledge base
    depth: Option<usize>,
}

/// Execute `path`
pub async fn execute(args: &PathArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let key = super::resolve_key(store, &args.kb, Some(&args.folder)).await?;
    let forest = store.current_forest().await;
    let outcome = PathOutcome {
        segments: path_of(&forest, &key),
        depth: forest.depth_of(&key),
    };

    match format {
        OutputFormat::Table => {
            println!("{}", outcome.segments.join(" / "));
            if let Some(depth) = outcome.depth {
                output::print_kv("depth", &depth.to_string());
            }
        }
        OutputFormat::Json => output::print_item(&outcome, "", format),
    }
    Ok(())
}
