//! Local interaction loop: terminal REPL over an in-process transcript.
//!
//! ```text
//! Idle ──> AwaitingInput ──┬── blank ───────────────> AwaitingInput
//!   ^                      ├── text ──> Processing ──┐
//!   │                      └── exit phrase / EOF ──> Closed
//!   └──────────── reply / error ─────────────────────┘
//! ```

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::errors::GatewayError;
use crate::gateway::CompletionGateway;
use crate::transcript::{MAX_WINDOW_TURNS, Transcript, Turn};

/// Inputs that end the conversation, compared case-insensitively.
pub const EXIT_PHRASES: &[&str] = &["good bye", "goodbye", "bye", "exit", "quit"];

/// Agent line printed (or fabricated) when the user says goodbye.
pub const FAREWELL: &str = "Good Bye!";

pub const BANNER: &str = "Start chatting with the agent. Type 'Good Bye' to exit.";
pub const PROMPT: &str = "You: ";

/// Whether `input` is one of [`EXIT_PHRASES`], ignoring case and surrounding whitespace.
pub fn is_exit_phrase(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_PHRASES.contains(&normalized.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingInput,
    Processing,
    Closed,
}

/// Result of feeding one line of input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Exit phrase; the session is now closed.
    Farewell,
    Reply(String),
    /// The gateway failed; the user turn stays, no assistant turn was added.
    Failed(GatewayError),
}

/// One CLI conversation: the transcript plus the gateway it talks to.
pub struct ChatSession {
    transcript: Transcript,
    gateway: Arc<dyn CompletionGateway>,
    state: LoopState,
}

impl ChatSession {
    pub fn new(system_prompt: impl Into<String>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            transcript: Transcript::new(system_prompt),
            gateway,
            state: LoopState::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LoopState::Closed
    }

    /// Mark the session as waiting for the next line.
    pub fn await_input(&mut self) {
        if !self.is_closed() {
            self.state = LoopState::AwaitingInput;
        }
    }

    /// Close the session without a farewell (end of input stream).
    pub fn close(&mut self) {
        self.state = LoopState::Closed;
    }

    /// Process one line of user input.
    pub async fn handle_input(&mut self, input: &str) -> TurnOutcome {
        if self.is_closed() {
            return TurnOutcome::Ignored;
        }

        let input = input.trim();
        if input.is_empty() {
            self.state = LoopState::AwaitingInput;
            return TurnOutcome::Ignored;
        }

        if is_exit_phrase(input) {
            tracing::debug!("exit phrase received, closing session");
            self.state = LoopState::Closed;
            return TurnOutcome::Farewell;
        }

        self.transcript.append(Turn::user(input));
        self.state = LoopState::Processing;

        let window = self.transcript.window(MAX_WINDOW_TURNS).to_vec();
        let outcome = match self.gateway.complete(&window).await {
            Ok(reply) => {
                self.transcript.append(Turn::assistant(reply.clone()));
                TurnOutcome::Reply(reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "completion call failed");
                TurnOutcome::Failed(e)
            }
        };

        self.state = LoopState::Idle;
        outcome
    }
}

/// Drive a session from `input` until an exit phrase or end of stream.
pub async fn run_repl<R, W>(session: &mut ChatSession, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{}\n", BANNER)?;

    loop {
        session.await_input();
        write!(out, "{}", console::style(PROMPT).cyan().bold())?;
        out.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            writeln!(out)?;
            session.close();
            break;
        };

        match session.handle_input(&line).await {
            TurnOutcome::Ignored => continue,
            TurnOutcome::Farewell => {
                writeln!(out, "{} {}", console::style("Agent:").green().bold(), FAREWELL)?;
                break;
            }
            TurnOutcome::Reply(reply) => {
                writeln!(out, "\n{} {}\n", console::style("Agent:").green().bold(), reply)?;
            }
            TurnOutcome::Failed(e) => {
                writeln!(
                    out,
                    "{} {}",
                    console::style("Error calling completion API:").red().bold(),
                    e
                )?;
            }
        }
    }

    Ok(())
}
