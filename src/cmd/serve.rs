//! Relay server command (`chatrelay serve`).

use std::sync::Arc;

use anyhow::Result;

use chatrelay::config::Settings;
use chatrelay::gateway::GroqGateway;
use chatrelay::relay::api::RelayState;
use chatrelay::relay::server::{ServerConfig, start_server};
use chatrelay::transcript::Turn;

pub async fn cmd_serve(
    settings: Settings,
    port: Option<u16>,
    host: Option<String>,
    cors: bool,
    open: bool,
) -> Result<()> {
    let api_key = settings.require_api_key()?;
    let gateway = GroqGateway::with_base_url(api_key, &settings.model, &settings.base_url);

    let state = Arc::new(RelayState {
        gateway: Arc::new(gateway),
        system: Turn::system(settings.system_prompt.clone()),
    });
    let config = ServerConfig {
        host: host.unwrap_or_else(|| settings.host.clone()),
        port: port.unwrap_or(settings.port),
        cors: cors || settings.cors,
    };

    // Spawn browser open before starting the server (which blocks)
    if open {
        let url = format!("http://localhost:{}", config.port);
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!(error = %e, "failed to open browser");
            }
        });
    }

    start_server(config, state).await
}
