//! Error types for mailsift.
//!
//! The scoring and compression heuristics never fail; these errors only
//! surface at configuration, remote-backend and ingestion boundaries.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Triage error: {0}")]
    Triage(#[from] TriageError),

    #[error("Remote backend error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classifier rule errors.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Invalid rule {name}: {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("Rule {rule} failed to evaluate: {reason}")]
    Predicate { rule: String, reason: String },
}

/// Errors from the remote digest service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Request to {backend} failed: {reason}")]
    RequestFailed { backend: String, reason: String },

    #[error("Request to {backend} timed out after {timeout:?}")]
    Timeout { backend: String, timeout: Duration },

    #[error("Invalid response from {backend}: {reason}")]
    InvalidResponse { backend: String, reason: String },

    #[error("Remote backend {backend} asked for local fallback: {reason}")]
    Fallback { backend: String, reason: String },
}

/// Errors turning raw mail into messages.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mailsift.
pub type Result<T> = std::result::Result<T, Error>;
