//! Remote terminal client (`chatrelay connect`).

use std::time::Duration;

use anyhow::Result;

use chatrelay::client::{RelayClient, run_client_repl};
use chatrelay::config::Settings;

pub async fn cmd_connect(
    settings: &Settings,
    server_url: Option<String>,
    reveal_ms: Option<u64>,
) -> Result<()> {
    let server_url = server_url.unwrap_or_else(|| settings.server_url.clone());
    let reveal_interval = reveal_ms
        .map(Duration::from_millis)
        .unwrap_or(settings.reveal_interval);
    tracing::debug!(%server_url, "connecting to relay");

    let mut client = RelayClient::new(server_url);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    run_client_repl(&mut client, stdin, &mut stdout, reveal_interval).await
}
