//! Folder mutation commands: `mkdir`, `rename`, `rm`.

use clap::Args;
use serde::Serialize;

use kbnav_core::error::AppError;
use kbnav_core::types::NodeKey;
use kbnav_tree::{TreeStore, breadcrumb};

use crate::output::{self, OutputFormat};

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Knowledge base ID
    #[arg(long)]
    pub kb: String,
    /// Parent folder ID (omit to create directly under the knowledge base)
    #[arg(long)]
    pub parent: Option<String>,
    /// Folder name
    pub name: String,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Knowledge base ID
    #[arg(long)]
    pub kb: String,
    /// Folder ID
    #[arg(long)]
    pub folder: String,
    /// New name
    pub name: String,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// Knowledge base ID
    #[arg(long)]
    pub kb: String,
    /// Folder ID
    #[arg(long)]
    pub folder: String,
}

/// Result of a folder mutation
#[derive(Debug, Serialize)]
struct FolderOutcome {
    /// Affected folder
    key: NodeKey,
    /// Breadcrumb after the mutation, empty once deleted
    path: String,
}

/// Execute `mkdir`
pub async fn mkdir(args: &MkdirArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let parent = super::resolve_key(store, &args.kb, args.parent.as_deref()).await?;
    let key = store.create_folder(&parent, &args.name).await?;
    let path = breadcrumb(&store.current_forest().await, &key, " / ");
    output::print_item(
        &FolderOutcome { key, path: path.clone() },
        &format!("Created {path}"),
        format,
    );
    Ok(())
}

/// Execute `rename`
pub async fn rename(args: &RenameArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let key = super::resolve_key(store, &args.kb, Some(&args.folder)).await?;
    store.rename_folder(&key, &args.name).await?;
    let path = breadcrumb(&store.current_forest().await, &key, " / ");
    output::print_item(
        &FolderOutcome { key, path: path.clone() },
        &format!("Renamed to {path}"),
        format,
    );
    Ok(())
}

/// Execute `rm`
pub async fn rm(args: &RmArgs, store: &TreeStore, format: OutputFormat) -> Result<(), AppError> {
    let key = super::resolve_key(store, &args.kb, Some(&args.folder)).await?;
    let before = breadcrumb(&store.current_forest().await, &key, " / ");
    store.delete_folder(&key).await?;
    output::print_item(
        &FolderOutcome {
            key,
            path: String::new(),
        },
        &format!("Deleted {before}"),
        format,
    );
    Ok(())
}
