use std::fs;
use std::path::PathBuf;

use crate::error::{RelayError, RelayResult};
use crate::models::RelayConfig;

const DATA_DIR: &str = ".mcp-relay";
const CONFIG_FILE: &str = "relay_config.json";

/// Get data directory path
pub fn get_data_dir() -> RelayResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RelayError::Config("failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    // Ensure directory exists
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .map_err(|e| RelayError::Config(format!("failed to create data directory: {}", e)))?;
    }

    Ok(data_dir)
}

/// Load relay config
pub fn load_relay_config() -> RelayResult<RelayConfig> {
    let data_dir = get_data_dir()?;
    let config_path = data_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(RelayConfig::default());
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| RelayError::Config(format!("failed to read config file: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| RelayError::Config(format!("failed to parse config file: {}", e)))
}

/// Save relay config
pub fn save_relay_config(config: &RelayConfig) -> RelayResult<()> {
    let data_dir = get_data_dir()?;
    let config_path = data_dir.join(CONFIG_FILE);

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| RelayError::Config(format!("failed to serialize config: {}", e)))?;

    fs::write(&config_path, content)
        .map_err(|e| RelayError::Config(format!("failed to save config: {}", e)))
}

/// Apply `MCP_RELAY_*` environment overrides on top of the file config.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    if let Ok(value) = std::env::var("MCP_RELAY_SERVER_URL") {
        config.server_url = value;
    }
    if let Ok(value) = std::env::var("MCP_RELAY_TOKEN_ENDPOINT") {
        config.token_endpoint = value;
    }
    if let Ok(value) = std::env::var("MCP_RELAY_TIMEOUT_SECS") {
        match value.parse::<u64>() {
            Ok(secs) if secs > 0 => config.request_timeout = secs,
            _ => tracing::warn!("ignoring invalid MCP_RELAY_TIMEOUT_SECS: {}", value),
        }
    }
    if let Ok(value) = std::env::var("MCP_RELAY_CREDENTIALS") {
        config.credentials_file = Some(PathBuf::from(value));
    }
}

/// Validate the endpoint URLs before the relay starts.
pub fn validate(config: &RelayConfig) -> RelayResult<()> {
    for (name, value) in [
        ("server_url", &config.server_url),
        ("token_endpoint", &config.token_endpoint),
    ] {
        url::Url::parse(value)
            .map_err(|e| RelayError::Config(format!("invalid {}: {} ({})", name, value, e)))?;
    }
    Ok(())
}
