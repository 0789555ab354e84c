//! Environment variables: `NEO4J_*` settings, `.env` files and
//! `{{ env.VAR }}` placeholder substitution

use neo4j_mcp_core::{ConnectionSettings, Neo4jMcpError, NormalizedError};
use neo4j_mcp_types::UriScheme;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Regex pattern for environment variable placeholders: {{ env.VAR_NAME }}
static ENV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap()
});

/// Recognised environment variable names
pub mod vars {
    pub const HOST: &str = "NEO4J_HOST";
    pub const PORT: &str = "NEO4J_PORT";
    pub const HTTP_PORT: &str = "NEO4J_HTTP_PORT";
    pub const USERNAME: &str = "NEO4J_USERNAME";
    pub const PASSWORD: &str = "NEO4J_PASSWORD";
    pub const DATABASE: &str = "NEO4J_DATABASE";
    pub const URI_SCHEME: &str = "NEO4J_URI_SCHEME";
    pub const ENCRYPTED: &str = "NEO4J_ENCRYPTED";
    pub const MAX_POOL_SIZE: &str = "NEO4J_MAX_POOL_SIZE";
    pub const ACQUIRE_TIMEOUT: &str = "NEO4J_ACQUIRE_TIMEOUT";
    pub const CONNECTION_TIMEOUT: &str = "NEO4J_CONNECTION_TIMEOUT";
    pub const MAX_CONNECTION_LIFETIME: &str = "NEO4J_MAX_CONNECTION_LIFETIME";

    pub const ALL: &[&str] = &[
        HOST,
        PORT,
        HTTP_PORT,
        USERNAME,
        PASSWORD,
        DATABASE,
        URI_SCHEME,
        ENCRYPTED,
        MAX_POOL_SIZE,
        ACQUIRE_TIMEOUT,
        CONNECTION_TIMEOUT,
        MAX_CONNECTION_LIFETIME,
    ];
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, Neo4jMcpError> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        Neo4jMcpError::ConfigFile(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            Neo4jMcpError::ConfigFile(format!("Invalid line in '{}': {}", path.display(), e))
        })?;
        values.insert(key, value);
    }
    Ok(values)
}

/// Build connection settings from `NEO4J_*` variables found through `lookup`
///
/// Unset and empty variables are absent. Malformed values fail with
/// `Configuration`, naming the variable but never echoing its value.
pub fn settings_from_vars<F>(lookup: F) -> Result<ConnectionSettings, NormalizedError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    Ok(ConnectionSettings {
        host: get(vars::HOST),
        port: parse_port(vars::PORT, get(vars::PORT))?,
        http_port: parse_port(vars::HTTP_PORT, get(vars::HTTP_PORT))?,
        username: get(vars::USERNAME),
        password: get(vars::PASSWORD),
        database: get(vars::DATABASE),
        uri_scheme: get(vars::URI_SCHEME)
            .map(|v| UriScheme::from_str(&v).map_err(NormalizedError::configuration))
            .transpose()?,
        encrypted: get(vars::ENCRYPTED)
            .map(|v| parse_bool(vars::ENCRYPTED, &v))
            .transpose()?,
        max_pool_size: parse_number(vars::MAX_POOL_SIZE, get(vars::MAX_POOL_SIZE))?,
        acquire_timeout_secs: parse_number(vars::ACQUIRE_TIMEOUT, get(vars::ACQUIRE_TIMEOUT))?,
        connection_timeout_secs: parse_number(
            vars::CONNECTION_TIMEOUT,
            get(vars::CONNECTION_TIMEOUT),
        )?,
        max_connection_lifetime_secs: parse_number(
            vars::MAX_CONNECTION_LIFETIME,
            get(vars::MAX_CONNECTION_LIFETIME),
        )?,
    })
}

fn parse_port(name: &str, value: Option<String>) -> Result<Option<u16>, NormalizedError> {
    match value {
        None => Ok(None),
        Some(v) => match v.trim().parse::<u16>() {
            Ok(port) if port > 0 => Ok(Some(port)),
            _ => Err(NormalizedError::configuration(format!(
                "{} must be a port number between 1 and 65535",
                name
            ))),
        },
    }
}

fn parse_number<T: FromStr>(
    name: &str,
    value: Option<String>,
) -> Result<Option<T>, NormalizedError> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                NormalizedError::configuration(format!("{} must be a non-negative integer", name))
            })
        })
        .transpose()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, NormalizedError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(NormalizedError::configuration(format!(
            "{} must be true or false",
            name
        ))),
    }
}

/// Environment variable substitution for configuration files
pub struct EnvSubstitutor {
    /// Whether to fail on missing environment variables
    strict: bool,
}

impl EnvSubstitutor {
    /// Create a new substitutor with strict mode (fails on missing vars)
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Create a new substitutor with lenient mode (leaves placeholders for missing vars)
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Substitute placeholders using values found through `lookup`
    pub fn substitute<F>(&self, content: &str, lookup: F) -> Result<String, Neo4jMcpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing: Vec<String> = Vec::new();

        let result = ENV_PATTERN.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match lookup(var_name) {
                Some(value) => value,
                None => {
                    if self.strict && !missing.iter().any(|m| m == var_name) {
                        missing.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });

        if !missing.is_empty() {
            return Err(Neo4jMcpError::EnvVarNotFound(missing.join(", ")));
        }

        Ok(result.into_owned())
    }

    /// Check if a string contains environment variable placeholders
    pub fn has_placeholders(content: &str) -> bool {
        ENV_PATTERN.is_match(content)
    }

    /// Extract all environment variable names from a string
    pub fn extract_var_names(content: &str) -> Vec<String> {
        ENV_PATTERN
            .captures_iter(content)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}

impl Default for EnvSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}
