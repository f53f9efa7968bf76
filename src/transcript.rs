//! Conversation transcript and request-window construction.
//!
//! A [`Transcript`] is the ordered history of [`Turn`]s for one session. It
//! always starts with the system turn. What is actually sent to the provider
//! is a *window*: the most recent [`MAX_WINDOW_TURNS`] entries of the
//! sequence, taken as a plain suffix. Once a conversation grows past that
//! size the system turn falls out of the window.

use serde::{Deserialize, Serialize};

/// Maximum number of turns sent to the provider per request.
pub const MAX_WINDOW_TURNS: usize = 20;

/// System prompt used when configuration does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant. Provide concise, runnable code only when asked. Be polite and brief.";

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered, append-only conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Start a transcript whose first entry is the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    /// Append a turn at the end.
    ///
    /// User turns with blank content are refused and leave the transcript
    /// untouched; the return value says whether the turn was stored.
    pub fn append(&mut self, turn: Turn) -> bool {
        if turn.role == Role::User && turn.content.trim().is_empty() {
            return false;
        }
        self.turns.push(turn);
        true
    }

    /// The last `max_turns` entries, in original order.
    pub fn window(&self, max_turns: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(max_turns);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of turns with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Build the window for a stateless relay request.
///
/// Produces `[system] + history + [user(message)]` and keeps only the last
/// `max_turns` entries of that combined list.
pub fn build_request_window(
    system: &Turn,
    history: &[Turn],
    message: &str,
    max_turns: usize,
) -> Vec<Turn> {
    let mut combined = Vec::with_capacity(history.len() + 2);
    combined.push(system.clone());
    combined.extend_from_slice(history);
    combined.push(Turn::user(message));

    let start = combined.len().saturating_sub(max_turns);
    combined.split_off(start)
}
