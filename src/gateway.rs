//! Completion gateway: one outbound chat-completion call per user turn.
//!
//! The provider speaks the OpenAI chat-completions format (Groq by default).
//! There are no retries and no timeout beyond reqwest's defaults.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;
use crate::transcript::Turn;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Reply text used when the provider answers without any candidate.
pub const NO_RESPONSE_PLACEHOLDER: &str = "[no response]";

/// Seam between the interaction loops and the completion provider.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send the prepared window and return the reply text.
    async fn complete(&self, window: &[Turn]) -> Result<String, GatewayError>;

    /// Model identifier, for logs and health output.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error envelope returned by OpenAI-compatible providers.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// reqwest-backed gateway for Groq's OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct GroqGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GroqGateway {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionGateway for GroqGateway {
    async fn complete(&self, window: &[Turn]) -> Result<String, GatewayError> {
        tracing::debug!(model = %self.model, turns = window.len(), "sending completion request");

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: window,
        };
        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), "completion API returned error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(first_candidate_text(parsed))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn first_candidate_text(resp: ChatCompletionResponse) -> String {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string())
}
