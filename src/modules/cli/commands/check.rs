//! Check command implementation

use clap::Args;
use neo4j_mcp_config::{resolve, ConfigSources};
use neo4j_mcp_core::{ConnectionReport, Neo4jMcpError};
use neo4j_mcp_runtime::{Neo4jConnectorFactory, Runtime};
use std::sync::Arc;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Print the report on a single line
    #[arg(long)]
    pub compact: bool,
}

impl CheckCommand {
    /// Execute the check command; returns whether the connection is healthy
    pub async fn execute(&self, sources: ConfigSources) -> Result<bool, Neo4jMcpError> {
        let config = resolve(&sources)?;
        let runtime = Runtime::new(config, Arc::new(Neo4jConnectorFactory));
        let report = runtime.check().await;

        println!("{}", self.render(&report)?);
        Ok(report.ok)
    }

    fn render(&self, report: &ConnectionReport) -> Result<String, Neo4jMcpError> {
        let text = if self.compact {
            serde_json::to_string(report)?
        } else {
            serde_json::to_string_pretty(report)?
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4j_mcp_core::NormalizedError;

    #[test]
    fn test_render_failure_report() {
        let report = ConnectionReport::failure(
            "neo4j",
            true,
            NormalizedError::not_started(),
        );
        let text = CheckCommand { compact: true }.render(&report).unwrap();
        assert!(!text.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["kind"], "Connectivity");
    }
}
