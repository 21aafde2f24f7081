//! CLI command definitions and dispatch.

pub mod docs;
pub mod folder;
pub mod path;
pub mod roots;
pub mod tree;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use kbnav_core::config::AppConfig;
use kbnav_core::error::AppError;
use kbnav_core::types::{FolderId, KnowledgeBaseId, NodeKey};
use kbnav_gateway::{EntityGateway, GatewayManager};
use kbnav_tree::TreeStore;

use crate::output::OutputFormat;

/// kbnav: knowledge-base folder tree browser
#[derive(Debug, Parser)]
#[command(name = "kbnav", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `<config dir>/<env>.toml`
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List knowledge bases
    Roots,
    /// Print the folder tree
    Tree(tree::TreeArgs),
    /// List the documents of a knowledge base or folder
    Docs(docs::DocsArgs),
    /// Create a folder
    Mkdir(folder::MkdirArgs),
    /// Rename a folder
    Rename(folder::RenameArgs),
    /// Delete a folder and everything below it
    Rm(folder::RmArgs),
    /// Print the breadcrumb of a folder
    Path(path::PathArgs),
}

impl Cli {
    /// Load configuration from the file, the optional overlay, and env vars
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.env {
            Some(env) => AppConfig::load_with_env(&self.config, env),
            None => AppConfig::load(&self.config),
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let store = open_store(config).await?;
        match &self.command {
            Commands::Roots => roots::execute(&store, self.format).await,
            Commands::Tree(args) => tree::execute(args, &store, self.format).await,
            Commands::Docs(args) => docs::execute(args, &store, self.format).await,
            Commands::Mkdir(args) => folder::mkdir(args, &store, self.format).await,
            Commands::Rename(args) => folder::rename(args, &store, self.format).await,
            Commands::Rm(args) => folder::rm(args, &store, self.format).await,
            Commands::Path(args) => path::execute(args, &store, self.format).await,
        }
    }
}

/// Helper: build the configured gateway and a store with the roots listed
pub async fn open_store(config: &AppConfig) -> Result<TreeStore, AppError> {
    let gateway = GatewayManager::new(&config.gateway)?;
    debug!(provider = gateway.provider_type(), "Gateway ready");
    let gateway: Arc<dyn EntityGateway> = Arc::new(gateway);

    let store = TreeStore::new(gateway, &config.tree);
    store.load_forest().await?;
    Ok(store)
}

/// Helper: key of a root, or of a folder inside it once the root is loaded
pub async fn resolve_key(
    store: &TreeStore,
    kb: &str,
    folder: Option<&str>,
) -> Result<NodeKey, AppError> {
    let root_key = NodeKey::root(KnowledgeBaseId::from(kb));
    if !store.current_forest().await.contains(&root_key) {
        return Err(AppError::not_found(format!("Knowledge base '{kb}' not found")));
    }

    let Some(folder) = folder else {
        return Ok(root_key);
    };
    store.expand(&root_key).await?;

    let key = NodeKey::folder(KnowledgeBaseId::from(kb), FolderId::from(folder));
    if !store.current_forest().await.contains(&key) {
        return Err(AppError::not_found(format!(
            "Folder '{folder}' not found in knowledge base '{kb}'"
        )));
    }
    Ok(key)
}
