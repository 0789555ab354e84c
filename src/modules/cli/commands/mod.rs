//! CLI commands

mod check;
mod completion;
mod init;
mod run;

pub use check::CheckCommand;
pub use completion::CompletionCommand;
pub use init::InitCommand;
pub use run::RunCommand;

use clap::{Parser, Subcommand, ValueEnum};
use neo4j_mcp_config::{ConfigSources, ServerSettings};
use neo4j_mcp_core::ConnectionSettings;
use std::path::PathBuf;
use tracing::Level;

/// neo4j-mcp - Model Context Protocol server for Neo4j
#[derive(Parser, Debug)]
#[command(name = "neo4j-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file
    ///
    /// Global, so it can follow the subcommand: `neo4j-mcp run -c neo4j-mcp.yaml`.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// `.env` file to read (defaults to `./.env` when present)
    #[arg(long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", global = true, default_value = "info")]
    pub log_level: Level,

    /// Log output format
    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override NEO4J_HOST
    #[arg(long = "neo4j-host", global = true)]
    pub neo4j_host: Option<String>,

    /// Override NEO4J_PORT
    #[arg(long = "neo4j-port", global = true)]
    pub neo4j_port: Option<u16>,

    /// Override NEO4J_DATABASE
    #[arg(long = "neo4j-database", global = true)]
    pub neo4j_database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log line format; logs always go to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server
    Run(RunCommand),

    /// Test the configured Neo4j connection
    Check(CheckCommand),

    /// Write sample configuration files
    Init(InitCommand),

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion(CompletionCommand),
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Effective log level, accounting for `--verbose`
    pub fn effective_log_level(&self) -> Level {
        if self.verbose && self.log_level < Level::DEBUG {
            Level::DEBUG
        } else {
            self.log_level
        }
    }

    /// Configuration sources described by the global flags
    pub fn config_sources(&self) -> ConfigSources {
        ConfigSources {
            config_file: self.config.clone(),
            env_file: self.env_file.clone(),
            overrides: ConnectionSettings {
                host: self.neo4j_host.clone(),
                port: self.neo4j_port,
                database: self.neo4j_database.clone(),
                ..Default::default()
            },
            server_overrides: ServerSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["neo4j-mcp", "run"]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.effective_log_level(), Level::INFO);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "neo4j-mcp",
            "check",
            "-c",
            "neo4j-mcp.yaml",
            "--neo4j-host",
            "graph.local",
            "--neo4j-port",
            "7688",
            "--log-format",
            "json",
        ])
        .unwrap();

        let sources = cli.config_sources();
        assert_eq!(sources.config_file, Some(PathBuf::from("neo4j-mcp.yaml")));
        assert_eq!(sources.overrides.host.as_deref(), Some("graph.local"));
        assert_eq!(sources.overrides.port, Some(7688));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_verbose_raises_level() {
        let cli = Cli::try_parse_from(["neo4j-mcp", "-v", "run"]).unwrap();
        assert_eq!(cli.effective_log_level(), Level::DEBUG);

        let cli = Cli::try_parse_from(["neo4j-mcp", "-v", "--log-level", "trace", "run"]).unwrap();
        assert_eq!(cli.effective_log_level(), Level::TRACE);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["neo4j-mcp", "--neo4j-port", "99999", "run"]).is_err());
    }
}
