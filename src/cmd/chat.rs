//! Local REPL (`chatrelay chat`).

use std::sync::Arc;

use anyhow::Result;

use chatrelay::config::Settings;
use chatrelay::gateway::GroqGateway;
use chatrelay::session::{ChatSession, run_repl};

pub async fn cmd_chat(settings: &Settings) -> Result<()> {
    let api_key = settings.require_api_key()?;
    let gateway = GroqGateway::with_base_url(api_key, &settings.model, &settings.base_url);
    tracing::debug!(model = %settings.model, "starting local chat session");

    let mut session = ChatSession::new(settings.system_prompt.clone(), Arc::new(gateway));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    run_repl(&mut session, stdin, &mut stdout).await
}
