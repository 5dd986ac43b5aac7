use std::sync::Arc;

use mcp_relay::models::{CredentialStore, RelayConfig};
use mcp_relay::modules;
use mcp_relay::proxy::upstream::UpstreamClient;
use mcp_relay::proxy::{sequencer, Relay, TokenManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modules::logger::init_logger();

    let mut config = match modules::config::load_relay_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("failed to load relay config: {}. using defaults", err);
            let cfg = RelayConfig::default();
            let _ = modules::config::save_relay_config(&cfg);
            cfg
        }
    };

    modules::config::apply_env_overrides(&mut config);
    modules::config::validate(&config)?;

    let data_dir = modules::config::get_data_dir()?;
    let store = CredentialStore::new(config.credentials_path(&data_dir));

    // No credentials means nothing downstream can authenticate: abort before
    // the sequencer ever starts.
    let record = match store.load() {
        Ok(record) => record,
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(1);
        }
    };

    let upstream = Arc::new(UpstreamClient::new(
        config.request_timeout,
        Some(config.upstream_proxy.clone()),
    ));
    let tokens = TokenManager::new(store, record, config.token_endpoint.clone());
    let mut relay = Relay::new(upstream, tokens, config.server_url.clone());

    tracing::info!("relay started, forwarding stdin to {}", config.server_url);

    let mut stdout = tokio::io::stdout();
    sequencer::run(&mut relay, tokio::io::stdin(), &mut stdout).await?;

    Ok(())
}
