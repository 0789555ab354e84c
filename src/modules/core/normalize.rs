//! Error normalization
//!
//! Every failure a backend can raise is described by [`DriverFailure`].
//! [`normalize`] maps each one onto exactly one [`ErrorKind`] and scrubs the
//! message of connection URIs, the configured host and the credentials before
//! it can reach a caller or a log line.
//!
//! Server-side failures carry a Neo4j status code of the form
//! `Neo.<Classification>.<Category>.<Title>`; classification follows that code.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{ErrorKind, NormalizedError};

/// Matches `scheme://user:password@` prefixes in URIs
static URI_CREDENTIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z][a-z0-9+.\-]*)://[^\s/@'\x22]+@").unwrap());

/// Matches a Neo4j status code anywhere in a message
static STATUS_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Neo\.(ClientError|ClientNotification|TransientError|DatabaseError)\.[A-Za-z]+\.[A-Za-z]+")
        .unwrap()
});

const CONNECTIVITY_HINT: &str = "check NEO4J_HOST/NEO4J_PORT and that the server is reachable";
const CREDENTIALS_HINT: &str = "check NEO4J_USERNAME/NEO4J_PASSWORD";
const PRIVILEGES_HINT: &str = "check the privileges granted to the configured user";

/// A failure raised by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverFailure {
    /// Connection refused, DNS failure, no routing information
    ServiceUnavailable(String),
    /// A pooled connection broke while a session was using it
    SessionExpired(String),
    /// The server rejected the credentials during the handshake
    AuthenticationFailed(String),
    /// Failure reported by the server with a Neo4j status code
    Server { code: String, message: String },
    /// The driver gave up waiting for the server
    Timeout(String),
    /// Socket-level I/O failure
    Io(String),
    /// Unexpected message or undecodable value on the wire
    Protocol(String),
    /// The descriptor could not be turned into a driver configuration
    InvalidConfiguration(String),
    /// The blocking worker panicked or was torn down
    Worker(String),
    /// Unclassified driver failure
    Other(String),
}

impl DriverFailure {
    /// Build a server failure by locating the status code inside driver text
    ///
    /// Falls back to [`DriverFailure::Other`] when no status code is present.
    pub fn from_server_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match STATUS_CODE.find(&text) {
            Some(code) => DriverFailure::Server {
                code: code.as_str().to_string(),
                message: text.clone(),
            },
            None => DriverFailure::Other(text),
        }
    }
}

impl fmt::Display for DriverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFailure::ServiceUnavailable(m) => write!(f, "service unavailable: {}", m),
            DriverFailure::SessionExpired(m) => write!(f, "session expired: {}", m),
            DriverFailure::AuthenticationFailed(m) => write!(f, "authentication failed: {}", m),
            DriverFailure::Server { code, message } => write!(f, "{}: {}", code, message),
            DriverFailure::Timeout(m) => write!(f, "timed out: {}", m),
            DriverFailure::Io(m) => write!(f, "i/o failure: {}", m),
            DriverFailure::Protocol(m) => write!(f, "protocol failure: {}", m),
            DriverFailure::InvalidConfiguration(m) => write!(f, "invalid configuration: {}", m),
            DriverFailure::Worker(m) => write!(f, "worker failure: {}", m),
            DriverFailure::Other(m) => f.write_str(m),
        }
    }
}

impl std::error::Error for DriverFailure {}

/// Scrubs connection details out of messages
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    /// A redactor that only strips credentials embedded in URIs
    pub fn new() -> Self {
        Self::default()
    }

    /// Also redact the given host, username and password
    ///
    /// The username is left alone when it equals `database`, which is the
    /// common `neo4j`/`neo4j` setup where redacting it would mangle database
    /// names in server messages.
    pub fn for_connection(
        host: &str,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
    ) -> Self {
        let mut rules = Vec::new();
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            rules.push((Self::token_pattern(password, password.len() >= 4), "****"));
        }
        if !host.is_empty() {
            rules.push((Self::token_pattern(host, true), "<host>"));
        }
        if let Some(username) = username.filter(|u| !u.is_empty() && *u != database) {
            rules.push((Self::token_pattern(username, false), "<user>"));
        }
        Self { rules }
    }

    fn token_pattern(token: &str, substring: bool) -> Regex {
        let escaped = regex::escape(token);
        let word_edges = token.starts_with(|c: char| c.is_alphanumeric() || c == '_')
            && token.ends_with(|c: char| c.is_alphanumeric() || c == '_');
        let pattern = if substring || !word_edges {
            escaped
        } else {
            format!(r"\b{}\b", escaped)
        };
        // An escaped literal always compiles.
        Regex::new(&pattern).unwrap_or_else(|_| Regex::new(&regex::escape(token)).unwrap())
    }

    /// Redact a message
    pub fn redact(&self, message: &str) -> String {
        let mut result = URI_CREDENTIALS
            .replace_all(message, "$1://<redacted>@")
            .into_owned();
        for (pattern, replacement) in &self.rules {
            result = pattern.replace_all(&result, *replacement).into_owned();
        }
        result
    }
}

/// Classify a Neo4j status code
///
/// Returns the kind and whether the failure is worth retrying.
pub fn classify_status_code(code: &str) -> (ErrorKind, bool) {
    let mut parts = code.split('.');
    let (Some("Neo"), Some(classification), Some(category), Some(title)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return (ErrorKind::Unknown, false);
    };

    match (classification, category, title) {
        ("ClientError", "Security", _) => (ErrorKind::Authentication, false),
        ("ClientError", "Schema", "ConstraintValidationFailed" | "ConstraintViolation") => {
            (ErrorKind::ConstraintViolation, false)
        }
        ("ClientError", "Statement", "AccessMode")
        | ("ClientError", "Transaction", "ForbiddenDueToTransactionType") => {
            (ErrorKind::AccessModeViolation, false)
        }
        ("ClientError", _, _) => (ErrorKind::QueryError, false),
        ("TransientError", "General", "DatabaseUnavailable") | ("TransientError", "Cluster", _) => {
            (ErrorKind::Connectivity, true)
        }
        ("TransientError", _, _) => (ErrorKind::QueryError, true),
        ("DatabaseError", _, _) => (ErrorKind::Unknown, false),
        _ => (ErrorKind::Unknown, false),
    }
}

/// Map a backend failure onto the fixed error taxonomy
pub fn normalize(failure: &DriverFailure, redactor: &Redactor) -> NormalizedError {
    let (kind, retryable, message) = match failure {
        DriverFailure::ServiceUnavailable(m) => (
            ErrorKind::Connectivity,
            true,
            format!("Neo4j service unavailable: {} ({})", m, CONNECTIVITY_HINT),
        ),
        DriverFailure::SessionExpired(m) => (
            ErrorKind::Connectivity,
            true,
            format!("Connection to Neo4j lost: {} ({})", m, CONNECTIVITY_HINT),
        ),
        DriverFailure::Io(m) => (
            ErrorKind::Connectivity,
            true,
            format!("Network failure talking to Neo4j: {} ({})", m, CONNECTIVITY_HINT),
        ),
        DriverFailure::Timeout(m) => (
            ErrorKind::Connectivity,
            true,
            format!("Timed out waiting for Neo4j: {} ({})", m, CONNECTIVITY_HINT),
        ),
        DriverFailure::AuthenticationFailed(m) => (
            ErrorKind::Authentication,
            false,
            format!("Neo4j authentication failed: {} ({})", m, CREDENTIALS_HINT),
        ),
        DriverFailure::Server { code, message } => {
            let (kind, retryable) = classify_status_code(code);
            let message = match kind {
                ErrorKind::Authentication if code.ends_with(".Forbidden") => {
                    format!("{} ({})", message, PRIVILEGES_HINT)
                }
                ErrorKind::Authentication => format!("{} ({})", message, CREDENTIALS_HINT),
                ErrorKind::Connectivity => format!("{} ({})", message, CONNECTIVITY_HINT),
                _ => message.clone(),
            };
            (kind, retryable, message)
        }
        DriverFailure::InvalidConfiguration(m) => (
            ErrorKind::Configuration,
            false,
            format!("Invalid connection configuration: {}", m),
        ),
        DriverFailure::Protocol(m) => (
            ErrorKind::Unknown,
            false,
            format!("Bolt protocol failure: {}", m),
        ),
        DriverFailure::Worker(m) => (
            ErrorKind::Unknown,
            false,
            format!("Query worker failed: {}", m),
        ),
        DriverFailure::Other(m) => (ErrorKind::Unknown, false, m.clone()),
    };

    NormalizedError {
        kind,
        message: redactor.redact(&message),
        retryable,
    }
}
