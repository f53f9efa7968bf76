//! Remote front-end: a terminal client for a running relay server.
//!
//! Plays the same role as the browser client. It owns the conversation
//! history, sends it with every request, checks exit phrases locally before
//! touching the network, and reveals replies with the typewriter effect.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::errors::ClientError;
use crate::gateway::NO_RESPONSE_PLACEHOLDER;
use crate::relay::api::ChatRequest;
use crate::reveal::reveal_to;
use crate::session::{BANNER, FAREWELL, PROMPT, is_exit_phrase};
use crate::transcript::Turn;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Success body; a null or missing `reply` is shown as the placeholder.
#[derive(Debug, serde::Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Result of sending one line through the client.
#[derive(Debug)]
pub enum SendOutcome {
    Ignored,
    /// Exit phrase handled locally; input is now disabled.
    Farewell,
    Reply(String),
    Failed(ClientError),
}

/// Client-side conversation state plus the HTTP connection to the relay.
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    history: Vec<Turn>,
    disabled: bool,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            history: Vec::new(),
            disabled: false,
        }
    }

    /// Turns held by the client (never includes the system turn).
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Handle one line of input.
    ///
    /// The user turn is recorded before the request goes out. Failures are
    /// reported but never stored as assistant turns.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let input = input.trim();
        if self.disabled || input.is_empty() {
            return SendOutcome::Ignored;
        }

        if is_exit_phrase(input) {
            self.history.push(Turn::assistant(FAREWELL));
            self.disabled = true;
            return SendOutcome::Farewell;
        }

        let prior = self.history.clone();
        self.history.push(Turn::user(input));

        match self.post_chat(prior, input).await {
            Ok(reply) => {
                self.history.push(Turn::assistant(reply.clone()));
                SendOutcome::Reply(reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "relay request failed");
                SendOutcome::Failed(e)
            }
        }
    }

    async fn post_chat(&self, history: Vec<Turn>, message: &str) -> Result<String, ClientError> {
        let body = ChatRequest {
            history,
            message: Some(message.to_string()),
        };
        let resp = self
            .http
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let mismatch = || ClientError::ProtocolMismatch {
            status: status.as_u16(),
            content_type: content_type.clone(),
        };
        if !content_type.starts_with("application/json") {
            return Err(mismatch());
        }

        if status.is_success() {
            let parsed: ReplyBody = serde_json::from_str(&text).map_err(|_| mismatch())?;
            return Ok(parsed
                .reply
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string()));
        }

        let parsed: ErrorBody = serde_json::from_str(&text).map_err(|_| mismatch())?;
        Err(ClientError::Api {
            status: status.as_u16(),
            message: parsed
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Server error".to_string()),
        })
    }
}

/// Drive a [`RelayClient`] from `input`, revealing replies on `out`.
pub async fn run_client_repl<R, W>(
    client: &mut RelayClient,
    input: R,
    out: &mut W,
    reveal_interval: Duration,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{}\n", BANNER)?;

    while !client.is_disabled() {
        write!(out, "{}", console::style(PROMPT).cyan().bold())?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            writeln!(out)?;
            break;
        };

        let text = match client.send(&line).await {
            SendOutcome::Ignored => continue,
            SendOutcome::Farewell => FAREWELL.to_string(),
            SendOutcome::Reply(reply) => reply,
            SendOutcome::Failed(ClientError::Network(msg)) => format!("Network error: {}", msg),
            SendOutcome::Failed(e) => format!("Error: {}", e),
        };

        write!(out, "{} ", console::style("Agent:").green().bold())?;
        reveal_to(out, &text, reveal_interval).await?;
        writeln!(out, "\n")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GatewayError;
    use crate::gateway::testing::ScriptedGateway;
    use crate::relay::api::RelayState;
    use crate::relay::server::build_router;
    use axum::{Json, Router, http::StatusCode, response::Html, routing::post};
    use serde_json::json;
    use std::sync::Arc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_relay(gateway: Arc<ScriptedGateway>) -> String {
        let state = Arc::new(RelayState {
            gateway,
            system: Turn::system("sys"),
        });
        serve(build_router(state, false)).await
    }

    #[tokio::test]
    async fn test_send_round_trip_records_history() {
        let gw = Arc::new(ScriptedGateway::replying(&["b", "d"]));
        let mut client = RelayClient::new(spawn_relay(gw.clone()).await);

        assert!(matches!(client.send("a").await, SendOutcome::Reply(r) if r == "b"));
        assert!(matches!(client.send("c").await, SendOutcome::Reply(r) if r == "d"));

        assert_eq!(
            client.history(),
            &[
                Turn::user("a"),
                Turn::assistant("b"),
                Turn::user("c"),
                Turn::assistant("d"),
            ]
        );
        // The server saw the prior history once plus the new message.
        let calls = gw.calls.lock().unwrap();
        assert_eq!(
            calls[1],
            vec![
                Turn::system("sys"),
                Turn::user("a"),
                Turn::assistant("b"),
                Turn::user("c"),
            ]
        );
    }

    #[tokio::test]
    async fn test_exit_phrase_disables_without_request() {
        let gw = Arc::new(ScriptedGateway::replying(&[]));
        let mut client = RelayClient::new(spawn_relay(gw.clone()).await);

        assert!(matches!(client.send("Goodbye").await, SendOutcome::Farewell));
        assert!(client.is_disabled());
        assert_eq!(client.history(), &[Turn::assistant(FAREWELL)]);
        assert!(matches!(client.send("hello").await, SendOutcome::Ignored));
        assert_eq!(gw.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        // Nothing listens here; a request would fail loudly.
        let mut client = RelayClient::new("http://127.0.0.1:9");
        assert!(matches!(client.send("   ").await, SendOutcome::Ignored));
        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_error_surfaces_as_api_error() {
        let gw = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::Transport(
            "down".into(),
        ))]));
        let mut client = RelayClient::new(spawn_relay(gw).await);

        match client.send("hi").await {
            SendOutcome::Failed(ClientError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("down"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert_eq!(client.history(), &[Turn::user("hi")]);
    }

    #[tokio::test]
    async fn test_html_response_is_protocol_mismatch() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::NOT_FOUND, Html("<h1>Not Found</h1>")) }),
        );
        let mut client = RelayClient::new(serve(app).await);

        match client.send("hi").await {
            SendOutcome::Failed(ClientError::ProtocolMismatch { status, content_type }) => {
                assert_eq!(status, 404);
                assert!(content_type.starts_with("text/html"));
            }
            other => panic!("Expected ProtocolMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_json_reply_without_text_uses_placeholder() {
        for body in [json!({"reply": null}), json!({}), json!({"reply": ""})] {
            let app = Router::new().route(
                "/api/chat",
                post(move || {
                    let body = body.clone();
                    async move { Json(body) }
                }),
            );
            let mut client = RelayClient::new(serve(app).await);

            match client.send("hi").await {
                SendOutcome::Reply(reply) => assert_eq!(reply, NO_RESPONSE_PLACEHOLDER),
                other => panic!("Expected placeholder reply, got {:?}", other),
            }
            assert_eq!(client.history()[1], Turn::assistant(NO_RESPONSE_PLACEHOLDER));
        }
    }

    #[tokio::test]
    async fn test_empty_error_text_falls_back_to_server_error() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({"error": ""}))) }),
        );
        let mut client = RelayClient::new(serve(app).await);

        match client.send("hi").await {
            SendOutcome::Failed(ClientError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Server error");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut client = RelayClient::new(format!("http://{}", addr));
        assert!(matches!(
            client.send("hi").await,
            SendOutcome::Failed(ClientError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_run_client_repl_reveals_reply_and_stops_on_farewell() {
        console::set_colors_enabled(false);
        let gw = Arc::new(ScriptedGateway::replying(&["hi there"]));
        let mut client = RelayClient::new(spawn_relay(gw.clone()).await);

        let mut out = Vec::new();
        run_client_repl(
            &mut client,
            "hello\nbye\nignored\n".as_bytes(),
            &mut out,
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Agent: hi there"));
        assert!(output.contains("Agent: Good Bye!"));
        assert_eq!(gw.call_count(), 1);
    }
}
