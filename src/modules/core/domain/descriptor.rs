//! Connection settings and the validated connection descriptor

use neo4j_mcp_types::UriScheme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::NormalizedError;
use crate::normalize::Redactor;

/// Default values applied when a setting is absent
pub mod defaults {
    use neo4j_mcp_types::UriScheme;

    pub const HOST: &str = "localhost";
    pub const PORT: u16 = 7687;
    pub const HTTP_PORT: u16 = 7474;
    pub const DATABASE: &str = "neo4j";
    pub const URI_SCHEME: UriScheme = UriScheme::Bolt;
    pub const ENCRYPTED: bool = false;
    pub const MAX_POOL_SIZE: usize = 100;
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 60;
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
    pub const MAX_CONNECTION_LIFETIME_SECS: u64 = 300;
}

/// Named connection settings as gathered from one configuration source
///
/// Every field is optional; sources are layered with [`ConnectionSettings::or`]
/// and the result is validated by [`ConnectionDescriptor::new`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_scheme: Option<UriScheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connection_lifetime_secs: Option<u64>,
}

impl ConnectionSettings {
    /// Layer `self` over `fallback`: values set here win
    pub fn or(self, fallback: ConnectionSettings) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            http_port: self.http_port.or(fallback.http_port),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            database: self.database.or(fallback.database),
            uri_scheme: self.uri_scheme.or(fallback.uri_scheme),
            encrypted: self.encrypted.or(fallback.encrypted),
            max_pool_size: self.max_pool_size.or(fallback.max_pool_size),
            acquire_timeout_secs: self.acquire_timeout_secs.or(fallback.acquire_timeout_secs),
            connection_timeout_secs: self
                .connection_timeout_secs
                .or(fallback.connection_timeout_secs),
            max_connection_lifetime_secs: self
                .max_connection_lifetime_secs
                .or(fallback.max_connection_lifetime_secs),
        }
    }

    /// Treat empty and whitespace-only strings as absent
    pub fn without_empty_strings(self) -> ConnectionSettings {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        ConnectionSettings {
            host: present(self.host).map(|h| h.trim().to_string()),
            username: present(self.username),
            password: present(self.password),
            database: present(self.database).map(|d| d.trim().to_string()),
            ..self
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("http_port", &self.http_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("database", &self.database)
            .field("uri_scheme", &self.uri_scheme)
            .field("encrypted", &self.encrypted)
            .field("max_pool_size", &self.max_pool_size)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .field("max_connection_lifetime_secs", &self.max_connection_lifetime_secs)
            .finish()
    }
}

/// Validated, immutable description of how to reach the database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    http_port: u16,
    credentials: Option<(String, String)>,
    database: String,
    scheme: UriScheme,
    max_pool_size: usize,
    acquire_timeout: Duration,
    connection_timeout: Duration,
    max_connection_lifetime: Duration,
}

impl ConnectionDescriptor {
    /// Validate settings and apply defaults
    ///
    /// Fails with `Configuration` on partial credentials, an empty or
    /// malformed host, port 0, pool size 0 or a zero timeout.
    pub fn new(settings: ConnectionSettings) -> Result<Self, NormalizedError> {
        let settings = settings.without_empty_strings();

        let credentials = match (settings.username, settings.password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(NormalizedError::configuration(
                    "NEO4J_USERNAME is set but NEO4J_PASSWORD is missing; set both or neither",
                ))
            }
            (None, Some(_)) => {
                return Err(NormalizedError::configuration(
                    "NEO4J_PASSWORD is set but NEO4J_USERNAME is missing; set both or neither",
                ))
            }
        };

        let host = settings.host.unwrap_or_else(|| defaults::HOST.to_string());
        if host.contains("://") || host.contains('@') || host.contains(char::is_whitespace) {
            return Err(NormalizedError::configuration(
                "NEO4J_HOST must be a bare host name or address, without scheme or credentials",
            ));
        }

        let port = settings.port.unwrap_or(defaults::PORT);
        let http_port = settings.http_port.unwrap_or(defaults::HTTP_PORT);
        if port == 0 || http_port == 0 {
            return Err(NormalizedError::configuration(
                "Ports must be in the range 1-65535",
            ));
        }

        let max_pool_size = settings.max_pool_size.unwrap_or(defaults::MAX_POOL_SIZE);
        if max_pool_size == 0 {
            return Err(NormalizedError::configuration(
                "NEO4J_MAX_POOL_SIZE must be at least 1",
            ));
        }

        let acquire_timeout = Self::timeout(
            "NEO4J_ACQUIRE_TIMEOUT",
            settings.acquire_timeout_secs,
            defaults::ACQUIRE_TIMEOUT_SECS,
        )?;
        let connection_timeout = Self::timeout(
            "NEO4J_CONNECTION_TIMEOUT",
            settings.connection_timeout_secs,
            defaults::CONNECTION_TIMEOUT_SECS,
        )?;
        let max_connection_lifetime = Self::timeout(
            "NEO4J_MAX_CONNECTION_LIFETIME",
            settings.max_connection_lifetime_secs,
            defaults::MAX_CONNECTION_LIFETIME_SECS,
        )?;

        let scheme = settings.uri_scheme.unwrap_or(defaults::URI_SCHEME);
        let scheme = if settings.encrypted.unwrap_or(defaults::ENCRYPTED) {
            scheme.secured()
        } else {
            scheme
        };

        Ok(Self {
            host,
            port,
            http_port,
            credentials,
            database: settings
                .database
                .unwrap_or_else(|| defaults::DATABASE.to_string()),
            scheme,
            max_pool_size,
            acquire_timeout,
            connection_timeout,
            max_connection_lifetime,
        })
    }

    fn timeout(name: &str, value: Option<u64>, default: u64) -> Result<Duration, NormalizedError> {
        match value.unwrap_or(default) {
            0 => Err(NormalizedError::configuration(format!(
                "{} must be greater than zero",
                name
            ))),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Shorten the acquisition timeout, mainly for tests and health checks
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size.max(1);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(user, _)| user.as_str())
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(_, pass)| pass.as_str())
    }

    /// Returns true when credentials are configured
    pub fn auth_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Effective scheme, already upgraded when encryption was requested
    pub fn scheme(&self) -> UriScheme {
        self.scheme
    }

    pub fn encrypted(&self) -> bool {
        self.scheme.is_secure()
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn max_connection_lifetime(&self) -> Duration {
        self.max_connection_lifetime
    }

    fn host_for_uri(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// Bolt connection target, never carrying credentials
    pub fn bolt_uri(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host_for_uri(), self.port)
    }

    /// Neo4j Browser URI
    pub fn http_uri(&self) -> String {
        let protocol = if self.encrypted() { "https" } else { "http" };
        format!("{}://{}:{}", protocol, self.host_for_uri(), self.http_port)
    }

    /// Redactor scrubbing this descriptor's host and credentials
    pub fn redactor(&self) -> Redactor {
        Redactor::for_connection(
            &self.host,
            self.username(),
            self.password(),
            &self.database,
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("uri", &self.bolt_uri())
            .field("database", &self.database)
            .field("username", &self.username())
            .field("password", &self.password().map(|_| "****"))
            .field("max_pool_size", &self.max_pool_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}
