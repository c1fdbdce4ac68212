//! Error types for hnmon

use std::time::Duration;
use thiserror::Error;

use crate::task::ResourceKind;

/// Result type alias for hnmon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Failure of a single outbound HTTP call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    NetworkFailure(String),

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<TransportError>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, network failures, 5xx and 429 are transient. Every other
    /// status and malformed requests are terminal.
    pub fn is_retriable(&self) -> bool {
        match self {
            TransportError::Timeout(_) | TransportError::NetworkFailure(_) => true,
            TransportError::HttpError { status, .. } => *status == 429 || *status >= 500,
            TransportError::RetriesExhausted { .. } | TransportError::InvalidRequest(_) => false,
        }
    }

    /// HTTP status of the final failure, if the server answered at all.
    #[cfg(test)]
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpError { status, .. } => Some(*status),
            TransportError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(Duration::ZERO)
        } else if err.is_connect() {
            TransportError::NetworkFailure("Failed to connect to API".to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::NetworkFailure(err.to_string())
        }
    }
}

/// Terminal failure of one fetch task. Recorded against that task only.
#[derive(Debug, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0} resources are not fetched through the scheduler")]
    Unsupported(ResourceKind),
}

impl TaskFailure {
    /// Short machine-friendly label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskFailure::Transport(TransportError::Timeout(_)) => "timeout",
            TaskFailure::Transport(TransportError::NetworkFailure(_)) => "network",
            TaskFailure::Transport(TransportError::HttpError { .. }) => "http",
            TaskFailure::Transport(TransportError::RetriesExhausted { .. }) => "retries_exhausted",
            TaskFailure::Transport(TransportError::InvalidRequest(_)) => "invalid_request",
            TaskFailure::Decode(_) => "decode",
            TaskFailure::Unsupported(_) => "unsupported",
        }
    }
}

/// Cache storage errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine a cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache entry is corrupted: {0}")]
    Corrupted(String),

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(String),
}

/// Aggregation run errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Could not reach the Hypernative API to enumerate suits: {0}")]
    EnumerationFailed(String),

    #[error(transparent)]
    Store(#[from] CacheError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `hnmon init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error(
        "API credentials not configured. Run `hnmon init` or set HNMON_CLIENT_ID and HNMON_CLIENT_SECRET."
    )]
    MissingCredentials,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
