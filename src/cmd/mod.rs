//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `chat`    | `Chat`           |
//! | `serve`   | `Serve`          |
//! | `connect` | `Connect`        |
//! | `config`  | `Config`         |

pub mod chat;
pub mod config;
pub mod connect;
pub mod serve;

pub use chat::cmd_chat;
pub use config::cmd_config;
pub use connect::cmd_connect;
pub use serve::cmd_serve;
