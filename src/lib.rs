pub mod client;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod relay;
pub mod reveal;
pub mod session;
pub mod transcript;
