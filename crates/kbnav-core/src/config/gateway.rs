//! Entity gateway configuration.

use serde::{Deserialize, Serialize};

/// Which backend answers folder, document, and knowledge-base requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway provider type: `"http"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the REST API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// JSON fixture used to seed the memory provider.
    #[serde(default)]
    pub fixture_path: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            auth_token: None,
            fixture_path: None,
        }
    }
}

fn default_provider() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}
