//! neo4j-mcp CLI
//!
//! Command-line interface for the Neo4j MCP server.

use anyhow::Context;
use neo4j_mcp_cli::{Cli, Commands, LogFormat};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();

    // Logs go to stderr; stdout carries the stdio transport
    let filter = EnvFilter::builder()
        .with_default_directive(cli.effective_log_level().into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    let sources = cli.config_sources();

    // Execute command
    match cli.command {
        Commands::Run(cmd) => {
            if let Err(e) = cmd.execute(sources).await {
                if e.is_error() {
                    error!("Server failed: {}", e.sanitized_message());
                } else {
                    warn!("Server stopped: {}", e.sanitized_message());
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Check(cmd) => {
            let ok = cmd.execute(sources).await.context("connection check failed")?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Init(cmd) => {
            cmd.execute().await.context("init failed")?;
        }
        Commands::Completion(cmd) => {
            cmd.execute();
        }
    }

    Ok(ExitCode::SUCCESS)
}
