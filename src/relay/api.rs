use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::RelayError;
use crate::gateway::CompletionGateway;
use crate::transcript::{MAX_WINDOW_TURNS, Turn, build_request_window};

// ── Shared application state ──────────────────────────────────────────

/// Immutable per-process state. Nothing in here changes between requests.
pub struct RelayState {
    pub gateway: Arc<dyn CompletionGateway>,
    pub system: Turn,
}

pub type SharedState = Arc<RelayState>;

// ── Request / response payload types ──────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Client-held transcript, without the system turn.
    #[serde(default, deserialize_with = "history_or_empty")]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

/// Anything that is not an array (null, a string, an object) counts as no history.
fn history_or_empty<'de, D>(deserializer: D) -> Result<Vec<Turn>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(Vec::new()),
    }
}

// ── Stateless relay ───────────────────────────────────────────────────

/// Handle one chat round trip without retaining anything.
///
/// Rebuilds the window as `[system] + history + [user(message)]`, capped at
/// the most recent [`MAX_WINDOW_TURNS`] entries, and asks the gateway.
pub async fn relay_chat(
    gateway: &dyn CompletionGateway,
    system: &Turn,
    request: ChatRequest,
) -> Result<ChatResponse, RelayError> {
    let message = match request.message {
        Some(m) if !m.is_empty() => m,
        _ => return Err(RelayError::MissingMessage),
    };

    let window = build_request_window(system, &request.history, &message, MAX_WINDOW_TURNS);
    let reply = gateway.complete(&window).await?;
    Ok(ChatResponse { reply })
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MissingMessage => {
                ApiError::BadRequest(RelayError::MissingMessage.to_string())
            }
            RelayError::Gateway(e) => {
                tracing::warn!(error = %e, "completion API error");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health_check))
}

async fn chat(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected chat payload");
        ApiError::BadRequest(rejection.body_text())
    })?;

    tracing::debug!(history = request.history.len(), "chat request");
    let response = relay_chat(state.gateway.as_ref(), &state.system, request).await?;
    Ok(Json(response))
}

async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        model: state.gateway.model().to_string(),
    })
}
