//! Configuration resolution for neo4j-mcp
//!
//! Settings are layered, highest precedence first:
//!
//! 1. command-line overrides
//! 2. process environment (`NEO4J_*`)
//! 3. a `.env` file (never overriding the real environment)
//! 4. a YAML settings file, with `{{ env.VAR }}` placeholders
//! 5. built-in defaults
//!
//! The merged settings are validated into a [`ConnectionDescriptor`].

pub mod env;
pub mod yaml;

pub use yaml::{ConfigFile, ServerSettings, YamlParser};

use neo4j_mcp_core::{ConnectionDescriptor, ConnectionSettings, Neo4jMcpError};
use neo4j_mcp_types::Transport;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default `.env` file looked up in the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Default HTTP binding for the `http` transport
pub const DEFAULT_SERVER_HOST: &str = "localhost";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where settings come from
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// YAML settings file
    pub config_file: Option<PathBuf>,
    /// Explicit `.env` file; when unset, `./.env` is used if it exists
    pub env_file: Option<PathBuf>,
    /// Connection settings from the command line
    pub overrides: ConnectionSettings,
    /// Server settings from the command line
    pub server_overrides: ServerSettings,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub descriptor: ConnectionDescriptor,
    pub transport: Transport,
    pub server_host: String,
    pub server_port: u16,
    pub request_timeout: Duration,
}

/// Resolve configuration against the real process environment
pub fn resolve(sources: &ConfigSources) -> Result<ResolvedConfig, Neo4jMcpError> {
    resolve_with(sources, |name| std::env::var(name).ok())
}

/// Resolve configuration, reading environment variables through `process_env`
pub fn resolve_with<F>(
    sources: &ConfigSources,
    process_env: F,
) -> Result<ResolvedConfig, Neo4jMcpError>
where
    F: Fn(&str) -> Option<String>,
{
    let dotenv = load_env_file(sources.env_file.as_deref())?;
    let lookup = |name: &str| process_env(name).or_else(|| dotenv.get(name).cloned());

    let file = match &sources.config_file {
        Some(path) => {
            debug!("Loading settings file {}", path.display());
            YamlParser::parse_file(path, &lookup)?
        }
        None => ConfigFile::default(),
    };

    let from_process = env::settings_from_vars(&process_env)?;
    let from_dotenv = env::settings_from_vars(|name| dotenv.get(name).cloned())?;

    let settings = sources
        .overrides
        .clone()
        .without_empty_strings()
        .or(from_process)
        .or(from_dotenv)
        .or(file.neo4j.without_empty_strings());

    let descriptor = ConnectionDescriptor::new(settings)?;

    let server = sources.server_overrides.clone().or(file.server);
    let server_port = server.port.unwrap_or(DEFAULT_SERVER_PORT);
    if server_port == 0 {
        return Err(Neo4jMcpError::ConfigFile(
            "server.port must be between 1 and 65535".to_string(),
        ));
    }

    Ok(ResolvedConfig {
        descriptor,
        transport: server.transport.unwrap_or_default(),
        server_host: server
            .host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
        server_port,
        request_timeout: Duration::from_secs(
            server
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
    })
}

fn load_env_file(explicit: Option<&Path>) -> Result<HashMap<String, String>, Neo4jMcpError> {
    match explicit {
        Some(path) => env::read_env_file(path),
        None => {
            let default = Path::new(DEFAULT_ENV_FILE);
            if default.is_file() {
                debug!("Loading {}", DEFAULT_ENV_FILE);
                env::read_env_file(default)
            } else {
                Ok(HashMap::new())
            }
        }
    }
}
