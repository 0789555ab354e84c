//! Error types for neo4j-mcp

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fixed set of error kinds visible to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Invalid or incomplete settings
    Configuration,
    /// Credentials rejected or insufficient privileges
    Authentication,
    /// Server unreachable, connection lost, or manager not started
    Connectivity,
    /// No session became available within the acquisition timeout
    PoolExhausted,
    /// Syntax or semantic error reported by the query engine
    QueryError,
    /// Schema constraint violated by a write
    ConstraintViolation,
    /// Mutation attempted under read access mode
    AccessModeViolation,
    /// Anything not classified above
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Authentication => "Authentication",
            ErrorKind::Connectivity => "Connectivity",
            ErrorKind::PoolExhausted => "PoolExhausted",
            ErrorKind::QueryError => "QueryError",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::AccessModeViolation => "AccessModeViolation",
            ErrorKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl ErrorKind {
    /// Returns all error kinds
    pub fn all() -> &'static [ErrorKind] {
        &[
            ErrorKind::Configuration,
            ErrorKind::Authentication,
            ErrorKind::Connectivity,
            ErrorKind::PoolExhausted,
            ErrorKind::QueryError,
            ErrorKind::ConstraintViolation,
            ErrorKind::AccessModeViolation,
            ErrorKind::Unknown,
        ]
    }

    /// Returns true if the failure was caused by the caller's request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::QueryError | ErrorKind::ConstraintViolation | ErrorKind::AccessModeViolation
        )
    }
}

/// The only error shape that crosses the core boundary
///
/// Messages are already redacted when this value is built; see
/// [`crate::normalize`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct NormalizedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Hint that repeating the same call later may succeed
    #[serde(default)]
    pub retryable: bool,
}

impl NormalizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::QueryError, message)
    }

    pub fn access_mode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessModeViolation, message)
    }

    /// Operation attempted before `start` or after `stop`
    pub fn not_started() -> Self {
        Self::new(
            ErrorKind::Connectivity,
            "Not connected to Neo4j: the connection manager is not started",
        )
    }

    pub fn pool_exhausted(waited: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::PoolExhausted,
            format!(
                "No session became available within {} ms; the connection pool is at capacity",
                waited.as_millis()
            ),
        )
        .retryable()
    }
}

/// Process-level error type
#[derive(Error, Debug)]
pub enum Neo4jMcpError {
    /// A normalized core failure
    #[error(transparent)]
    Normalized(#[from] NormalizedError),

    /// Configuration file parsing error
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    /// Environment variable referenced by the configuration file is missing
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// Transport or HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Neo4jMcpError {
    /// Returns true if this error should be logged at error level
    pub fn is_error(&self) -> bool {
        match self {
            Neo4jMcpError::Normalized(e) => !e.kind.is_client_error(),
            Neo4jMcpError::Server(_) | Neo4jMcpError::Internal(_) => true,
            _ => false,
        }
    }

    /// The normalized view of this error
    pub fn to_normalized(&self) -> NormalizedError {
        match self {
            Neo4jMcpError::Normalized(e) => e.clone(),
            Neo4jMcpError::ConfigFile(msg) => NormalizedError::configuration(msg.clone()),
            Neo4jMcpError::EnvVarNotFound(name) => NormalizedError::configuration(format!(
                "Environment variable not found: {}",
                name
            )),
            other => NormalizedError::new(ErrorKind::Unknown, other.sanitized_message()),
        }
    }

    /// Sanitize the error message to avoid leaking sensitive information
    pub fn sanitized_message(&self) -> String {
        match self {
            // Already redacted at construction
            Neo4jMcpError::Normalized(e) => e.to_string(),

            // Don't expose internal details
            Neo4jMcpError::Internal(_) => "Internal server error".to_string(),
            Neo4jMcpError::Io(_) => "I/O error".to_string(),

            _ => self.to_string(),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, NormalizedError>;
