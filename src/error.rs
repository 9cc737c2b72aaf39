// Error types module

use std::fmt;

use redis::RedisError;
use thiserror::Error;

/// Coarse failure categories surfaced by every client operation
///
/// Callers that only care whether an operation failed can ignore the kind and
/// treat [`ClientError`] as a single opaque error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Store unreachable, connection refused, dropped or timed out
    Connectivity,

    /// Stored or incoming data has the wrong shape for the requested mutation
    DataShape,

    /// JSON encoding or decoding failed
    Serialization,

    /// Invalid settings (bad URL, zero TTL, unreadable config file, etc.)
    Configuration,

    /// Any other failure reported by the store client
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connectivity => write!(f, "Connectivity error"),
            ErrorKind::DataShape => write!(f, "Data shape error"),
            ErrorKind::Serialization => write!(f, "Serialization error"),
            ErrorKind::Configuration => write!(f, "Configuration error"),
            ErrorKind::Unexpected => write!(f, "Unexpected error"),
        }
    }
}

/// The single error type returned by the client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ClientError {
    kind: ErrorKind,
    message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connectivity, message)
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataShape, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::serialization(err.to_string())
    }
}

/// Collapses the store client's error taxonomy into [`ErrorKind`]
///
/// Refused connections get their own message. Anything that is neither I/O nor
/// a client configuration problem becomes `Unexpected`.
impl From<RedisError> for ClientError {
    fn from(err: RedisError) -> Self {
        if err.is_connection_refusal() {
            ClientError::connectivity(format!(
                "Unable to connect to redis, data: not saved! {}",
                err
            ))
        } else if err.is_io_error() || err.is_timeout() || err.is_connection_dropped() {
            ClientError::connectivity(format!("Connection error: {}", err))
        } else if err.kind() == redis::ErrorKind::InvalidClientConfig {
            ClientError::configuration(format!("Invalid client configuration: {}", err))
        } else {
            ClientError::unexpected(format!("Exception error: {}", err))
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
