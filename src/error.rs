use thiserror::Error;

use crate::core::Channel;

/// Payload could not be turned into a complete frame. The cycle is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed length for {what}: expected {expected}, got {actual}")]
    MalformedLength {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed value in field {index}: {detail}")]
    MalformedValue { index: usize, detail: String },
}

impl DecodeError {
    pub(crate) fn channel_length(channel: Channel, expected: usize, actual: usize) -> Self {
        Self::MalformedLength {
            what: format!("{} payload (bytes)", channel),
            expected,
            actual,
        }
    }
}

/// Transport-level failure, subject to the reconnect policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("link disconnected: {0}")]
    Disconnected(String),

    /// Closed from outside; the loop treats this as a stop request
    #[error("transport closed")]
    Closed,

    #[error("failed to bind {addr}: {detail}")]
    Bind { addr: String, detail: String },

    #[error("transport I/O error: {0}")]
    Io(String),

    #[error("reconnection failed after {attempts} attempts: {last}")]
    ReconnectExhausted { attempts: usize, last: String },
}

impl TransportError {
    /// Whether the reconnect policy applies to this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Disconnected(_) | Self::Io(_)
        )
    }
}

/// Durable log write failure. Non-fatal for the session.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open log {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append record: {0}")]
    Write(#[from] std::io::Error),

    #[error("invalid record on line {line}: {detail}")]
    Parse { line: usize, detail: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid session state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("ingestion task aborted: {0}")]
    Join(String),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
