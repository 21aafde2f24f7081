//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod gateway;
pub mod logging;
pub mod tree;

use serde::{Deserialize, Serialize};

use self::gateway::GatewayConfig;
use self::logging::LoggingConfig;
use self::tree::TreeConfig;

use crate::error::AppError;

/// Prefix of environment variables that override file settings.
const ENV_PREFIX: &str = "KBNAV";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Entity gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Tree cache settings.
    #[serde(default)]
    pub tree: TreeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file plus `KBNAV__*` environment
    /// variables. A missing file is not an error.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::build(path, None)
    }

    /// Load configuration from a TOML file, then the `{env}.toml` overlay
    /// that sits next to it, then environment variables.
    pub fn load_with_env(path: &str, env: &str) -> Result<Self, AppError> {
        Self::build(path, Some(env))
    }

    fn build(path: &str, env: Option<&str>) -> Result<Self, AppError> {
        let base = path.trim_end_matches(".toml");
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(base).required(false));

        if let Some(env) = env {
            let overlay = match std::path::Path::new(base).parent() {
                Some(dir) if !dir.as_os_str().is_empty() => {
                    dir.join(env).to_string_lossy().into_owned()
                }
                _ => env.to_string(),
            };
            builder = builder.add_source(config::File::with_name(&overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
