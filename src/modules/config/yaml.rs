//! YAML settings file

use neo4j_mcp_core::{ConnectionSettings, Neo4jMcpError};
use neo4j_mcp_types::Transport;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::env::EnvSubstitutor;

/// Server-side settings: transport and HTTP binding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Request timeout for the HTTP transport, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Layer `self` over `fallback`: values set here win
    pub fn or(self, fallback: ServerSettings) -> ServerSettings {
        ServerSettings {
            transport: self.transport.or(fallback.transport),
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            request_timeout_secs: self.request_timeout_secs.or(fallback.request_timeout_secs),
        }
    }
}

/// Contents of a `neo4j-mcp.yaml` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub neo4j: ConnectionSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// YAML parser for settings files
pub struct YamlParser;

impl YamlParser {
    /// Parse a settings file, substituting `{{ env.VAR }}` placeholders first
    pub fn parse<F>(content: &str, lookup: F) -> Result<ConfigFile, Neo4jMcpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let substituted = EnvSubstitutor::new().substitute(content, lookup)?;
        Self::parse_raw(&substituted)
    }

    /// Parse a settings file without placeholder substitution
    pub fn parse_raw(content: &str) -> Result<ConfigFile, Neo4jMcpError> {
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_yaml::from_str::<ConfigFile>(content)
            .map_err(|e| Neo4jMcpError::ConfigFile(format!("YAML parse error: {}", e)))
    }

    /// Read and parse a settings file from disk
    pub fn parse_file<F>(path: &Path, lookup: F) -> Result<ConfigFile, Neo4jMcpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Neo4jMcpError::ConfigFile(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        Self::parse(&content, lookup)
    }
}
