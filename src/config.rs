//! Configuration for chatrelay.
//!
//! Settings are resolved once at startup from three layers, later layers
//! winning:
//! 1. `chatrelay.toml` (optional)
//! 2. Environment variables (a `.env` file is loaded first if present)
//! 3. CLI flags, applied by the command that owns them
//!
//! # Configuration File Format
//!
//! ```toml
//! [provider]
//! model = "llama-3.3-70b-versatile"
//! base_url = "https://api.groq.com/openai/v1"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! cors = false
//!
//! [client]
//! server_url = "http://localhost:3000"
//! reveal_interval_ms = 16
//!
//! [chat]
//! system_prompt = "You are a helpful coding assistant."
//! ```
//!
//! The API key is only ever read from the environment (`GROQ_API_KEY`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_SERVER_URL;
use crate::errors::ConfigError;
use crate::gateway::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::relay::server::DEFAULT_PORT;
use crate::reveal::DEFAULT_REVEAL_INTERVAL;
use crate::transcript::DEFAULT_SYSTEM_PROMPT;

pub const CONFIG_FILE_NAME: &str = "chatrelay.toml";

pub const ENV_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_BASE_URL: &str = "GROQ_BASE_URL";
pub const ENV_PORT: &str = "PORT";
pub const ENV_SERVER_URL: &str = "CHATRELAY_SERVER_URL";

/// `[provider]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Permissive CORS, for a browser client served from another origin
    #[serde(default)]
    pub cors: bool,
}

/// `[client]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_interval_ms: Option<u64>,
}

/// `[chat]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// The complete chatrelay.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub chat: ChatSection,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path` if given, else `chatrelay.toml` in `dir` if it exists, else defaults.
    ///
    /// An explicitly named file must exist; the implicit one is optional.
    pub fn load_or_default(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let implicit = dir.join(CONFIG_FILE_NAME);
        if implicit.exists() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let content = toml::to_string_pretty(self).context("Failed to serialize chatrelay.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Effective settings after layering file, environment and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub server_url: String,
    pub reveal_interval: Duration,
    pub system_prompt: String,
    /// Config file the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings using the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let file = ConfigFile::load_or_default(config_path, &cwd)?;
        let source = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => Some(cwd.join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };
        let mut settings = Self::resolve(file, |key| std::env::var(key).ok())?;
        settings.source = source;
        Ok(settings)
    }

    /// Layer `env` over `file` over built-in defaults.
    pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let port = match lookup(ENV_PORT) {
            Some(raw) => parse_port(&raw)?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            api_key: lookup(ENV_API_KEY),
            model: lookup(ENV_MODEL)
                .or(file.provider.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup(ENV_BASE_URL)
                .or(file.provider.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            host: file.server.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            cors: file.server.cors,
            server_url: lookup(ENV_SERVER_URL)
                .or(file.client.server_url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            reveal_interval: file
                .client
                .reveal_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REVEAL_INTERVAL),
            system_prompt: file
                .chat
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            source: None,
        })
    }

    /// The provider API key; its absence is fatal for commands that call the provider.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// API key with all but the last four characters hidden, for display.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let visible: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", visible)
        })
    }
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(raw.to_string())),
    }
}
