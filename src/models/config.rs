use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Relay service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay endpoint the envelopes are POSTed to
    pub server_url: String,

    /// OAuth token endpoint for the refresh-token exchange
    pub token_endpoint: String,

    /// Per-call request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Credential file override; defaults to `credentials.json` in the data dir
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Upstream proxy configuration
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Upstream proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Enabled or not
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_url: "https://api.supermemory.ai/mcp".to_string(),
            token_endpoint: "https://api.supermemory.ai/api/auth/mcp/token".to_string(),
            request_timeout: default_request_timeout(),
            credentials_file: None,
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_request_timeout() -> u64 {
    15
}

impl RelayConfig {
    /// Resolve the credential file location.
    pub fn credentials_path(&self, data_dir: &Path) -> PathBuf {
        match &self.credentials_file {
            Some(path) => path.clone(),
            None => data_dir.join("credentials.json"),
        }
    }
}
