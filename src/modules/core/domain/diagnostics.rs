//! Connection diagnostics report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NormalizedError;

/// One row of `dbms.components()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerComponent {
    pub name: String,
    pub versions: Vec<String>,
    pub edition: String,
}

/// Server metadata read from a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: Option<String>,
    pub edition: Option<String>,
    #[serde(default)]
    pub components: Vec<ServerComponent>,
}

impl ServerInfo {
    /// Build from component rows, taking version and edition from the kernel
    pub fn from_components(components: Vec<ServerComponent>) -> Self {
        let kernel = components
            .iter()
            .find(|c| c.name == "Neo4j Kernel")
            .or_else(|| components.first());
        Self {
            version: kernel.and_then(|c| c.versions.first().cloned()),
            edition: kernel.map(|c| c.edition.clone()),
            components,
        }
    }
}

/// Outcome of a connection test; failures are data, not errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub ok: bool,
    pub server_version: Option<String>,
    pub server_edition: Option<String>,
    /// Round-trip latency of the trivial query
    pub latency_ms: Option<f64>,
    pub database: String,
    pub auth_enabled: bool,
    #[serde(default)]
    pub components: Vec<ServerComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NormalizedError>,
    pub checked_at: DateTime<Utc>,
}

impl ConnectionReport {
    pub fn success(
        database: impl Into<String>,
        auth_enabled: bool,
        latency: Duration,
        info: ServerInfo,
    ) -> Self {
        Self {
            ok: true,
            server_version: info.version,
            server_edition: info.edition,
            latency_ms: Some(latency.as_secs_f64() * 1000.0),
            database: database.into(),
            auth_enabled,
            components: info.components,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn failure(
        database: impl Into<String>,
        auth_enabled: bool,
        error: NormalizedError,
    ) -> Self {
        Self {
            ok: false,
            server_version: None,
            server_edition: None,
            latency_ms: None,
            database: database.into(),
            auth_enabled,
            components: Vec::new(),
            error: Some(error),
            checked_at: Utc::now(),
        }
    }
}
