//! Run command implementation

use clap::Args;
use neo4j_mcp_config::{resolve, ConfigSources};
use neo4j_mcp_core::Neo4jMcpError;
use neo4j_mcp_runtime::{Neo4jConnectorFactory, Runtime};
use neo4j_mcp_types::Transport;
use std::sync::Arc;
use tracing::info;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Transport: stdio or http
    #[arg(short, long)]
    pub transport: Option<Transport>,

    /// Bind address for the http transport
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the http transport
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, sources: ConfigSources) -> Result<(), Neo4jMcpError> {
        let sources = self.apply(sources);
        let config = resolve(&sources)?;

        info!(
            uri = %config.descriptor.bolt_uri(),
            database = config.descriptor.database(),
            transport = %config.transport,
            "Starting neo4j-mcp"
        );

        let runtime = Runtime::new(config, Arc::new(Neo4jConnectorFactory));
        runtime.run().await
    }

    /// Layer the command's server flags over the global sources
    fn apply(&self, mut sources: ConfigSources) -> ConfigSources {
        sources.server_overrides.transport = self.transport.or(sources.server_overrides.transport);
        sources.server_overrides.host = self.host.clone().or(sources.server_overrides.host);
        sources.server_overrides.port = self.port.or(sources.server_overrides.port);
        sources
    }
}
