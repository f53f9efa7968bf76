//! Relay server: stateless HTTP front for the completion gateway.
//!
//! ```text
//! ┌──────────┐  POST /api/chat {history, message}  ┌──────────────────────────────┐
//! │ Browser  │ ──────────────────────────────────> │ server.rs (Router, ServerConfig)
//! │ (web/)   │ <────────────────────────────────── │   └─ api.rs  relay_chat()     │
//! └──────────┘        {reply} | {error}            │         │                     │
//!                                                  │         v                     │
//!                                                  │   gateway::CompletionGateway  │
//!                                                  └──────────────────────────────┘
//! ```
//!
//! The browser owns the conversation and sends it with every request. The
//! server prepends its own system turn, answers, and forgets the exchange.
//!
//! | Module     | Responsibility                                         |
//! |------------|--------------------------------------------------------|
//! | `api`      | `/api/chat` + `/health` handlers, `relay_chat()`       |
//! | `server`   | Router assembly, static UI fallback, listen/shutdown   |
//! | `embedded` | Statically embeds the browser client (`rust-embed`)    |

pub mod api;
pub mod embedded;
pub mod server;
