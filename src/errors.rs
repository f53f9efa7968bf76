//! Typed error hierarchy for chatrelay.
//!
//! Four top-level enums, one per boundary:
//! - `ConfigError`: startup configuration failures (fatal)
//! - `GatewayError`: a single completion call failed (recoverable per turn)
//! - `RelayError`: the stateless `/api/chat` handler rejected or failed a request
//! - `ClientError`: the remote front-end could not get a reply from the relay

use thiserror::Error;

/// Errors raised while assembling configuration at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing GROQ_API_KEY in environment. Set it in .env or your environment variables.")]
    MissingApiKey,

    #[error("Failed to read config file at {path}: {source}")]
    FileReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    InvalidFile {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Invalid port '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),
}

/// Failure of one outbound completion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Request to completion API failed: {0}")]
    Transport(String),

    #[error("Completion API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Completion API returned an unreadable response: {0}")]
    MalformedResponse(String),
}

/// Errors from the stateless relay handler.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing message")]
    MissingMessage,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors seen by a client talking to the relay server.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(
        "Server returned non-JSON content (HTTP {status}, content-type '{content_type}'). \
         The API endpoint is probably not wired up: check that the relay server is running \
         and that the server URL points at it rather than at a static file host."
    )]
    ProtocolMismatch { status: u16, content_type: String },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_missing_key_names_variable() {
        let err = ConfigError::MissingApiKey;
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_config_error_file_read_failed_carries_path() {
        use std::path::PathBuf;
        let path = PathBuf::from("/etc/chatrelay.toml");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = ConfigError::FileReadFailed {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            ConfigError::FileReadFailed { path: p, source: s } => {
                assert_eq!(p, &path);
                assert_eq!(s.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected FileReadFailed"),
        }
    }

    #[test]
    fn test_gateway_error_status_message_is_readable() {
        let err = GatewayError::Status {
            status: 401,
            message: "Invalid API Key".to_string(),
        };
        assert_eq!(err.to_string(), "Completion API returned 401: Invalid API Key");
    }

    #[test]
    fn test_relay_error_missing_message_text() {
        assert_eq!(RelayError::MissingMessage.to_string(), "Missing message");
    }

    #[test]
    fn test_relay_error_converts_from_gateway_error() {
        let inner = GatewayError::Transport("connection refused".to_string());
        let relay_err: RelayError = inner.clone().into();
        match &relay_err {
            RelayError::Gateway(e) => assert_eq!(e, &inner),
            _ => panic!("Expected RelayError::Gateway"),
        }
        assert_eq!(relay_err.to_string(), inner.to_string());
    }

    #[test]
    fn test_client_error_protocol_mismatch_mentions_deployment() {
        let err = ClientError::ProtocolMismatch {
            status: 404,
            content_type: "text/html".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("non-JSON"));
        assert!(msg.contains("text/html"));
        assert!(msg.contains("server URL"));
    }

    #[test]
    fn test_all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ConfigError::MissingApiKey);
        assert_std_error(&GatewayError::MalformedResponse("x".into()));
        assert_std_error(&RelayError::MissingMessage);
        assert_std_error(&ClientError::Network("x".into()));
    }
}
