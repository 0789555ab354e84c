//! MCP resources: schema and connection summaries

use neo4j_mcp_core::{ConnectionDescriptor, ConnectionReport};
use neo4j_mcp_types::runtime::{error_codes, McpError};
use serde_json::{json, Value};
use std::fmt::Write;

use crate::state::AppState;

pub const SCHEMA_URI: &str = "neo4j://schema";
pub const CONNECTION_URI: &str = "neo4j://connection";

/// Resource descriptors returned by `resources/list`
pub fn definitions() -> Vec<Value> {
    vec![
        json!({
            "uri": SCHEMA_URI,
            "name": "Database schema",
            "description": "Node labels with counts, relationship types and property keys",
            "mimeType": "text/plain"
        }),
        json!({
            "uri": CONNECTION_URI,
            "name": "Connection information",
            "description": "Connection target, authentication and live server status",
            "mimeType": "text/plain"
        }),
    ]
}

/// Read one resource
///
/// Backend failures are rendered into the text; only unknown URIs are errors.
pub async fn read(state: &AppState, uri: &str) -> Result<Value, McpError> {
    let text = match uri {
        SCHEMA_URI => match state.schema.get_schema(None).await {
            Ok(snapshot) => snapshot.render_text(),
            Err(err) => format!("Error retrieving schema: {}", err),
        },
        CONNECTION_URI => {
            let report = state.diagnostics.test_connection().await;
            render_connection(&state.descriptor, &report)
        }
        _ => {
            return Err(McpError {
                code: error_codes::INVALID_PARAMS,
                message: format!("Unknown resource: {}", uri),
                data: None,
            })
        }
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "text/plain",
            "text": text
        }]
    }))
}

fn render_connection(descriptor: &ConnectionDescriptor, report: &ConnectionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Neo4j Connection Information");
    let _ = writeln!(out);
    let _ = writeln!(out, "Server URI: {}", descriptor.bolt_uri());
    let _ = writeln!(out, "HTTP URI: {}", descriptor.http_uri());
    let _ = writeln!(out, "Database: {}", descriptor.database());
    let _ = writeln!(
        out,
        "Authentication: {}",
        if descriptor.auth_enabled() { "Enabled" } else { "Disabled" }
    );
    let _ = writeln!(out, "Encrypted: {}", descriptor.encrypted());
    let _ = writeln!(out);

    if report.ok {
        let _ = writeln!(out, "Connection Status: Connected");
        if let Some(latency) = report.latency_ms {
            let _ = writeln!(out, "Latency: {:.1} ms", latency);
        }
        if !report.components.is_empty() {
            let _ = writeln!(out, "Server Components:");
            for component in &report.components {
                let _ = writeln!(
                    out,
                    "  - {}: {} ({})",
                    component.name,
                    component.versions.join(", "),
                    component.edition
                );
            }
        }
    } else {
        let _ = writeln!(out, "Connection Status: Disconnected");
        if let Some(err) = &report.error {
            let _ = writeln!(out, "Error: {}", err);
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::testing::Script;
    use crate::state::scripted;
    use neo4j_mcp_core::{ErrorKind, ServerComponent, ServerInfo};
    use tokio_test::{assert_err, assert_ok};

    fn text(value: &Value) -> &str {
        value["contents"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_schema_resource() {
        let script = Script::new();
        let state = scripted(&script).await;
        let value = assert_ok!(read(&state, SCHEMA_URI).await);
        assert!(text(&value).starts_with("Neo4j Database Schema (neo4j)"));
        assert_eq!(value["contents"][0]["uri"], json!(SCHEMA_URI));
    }

    #[tokio::test]
    async fn test_connection_resource() {
        let script = Script::new();
        script.set_server(ServerInfo::from_components(vec![ServerComponent {
            name: "Neo4j Kernel".into(),
            versions: vec!["5.26.1".into()],
            edition: "community".into(),
        }]));
        let state = scripted(&script).await;

        let value = assert_ok!(read(&state, CONNECTION_URI).await);
        let text = text(&value);
        assert!(text.contains("Server URI: bolt://localhost:7687"));
        assert!(text.contains("HTTP URI: http://localhost:7474"));
        assert!(text.contains("Authentication: Disabled"));
        assert!(text.contains("Connection Status: Connected"));
        assert!(text.contains("  - Neo4j Kernel: 5.26.1 (community)"));
    }

    #[tokio::test]
    async fn test_connection_resource_after_stop() {
        let script = Script::new();
        let state = scripted(&script).await;
        state.executor.connections().stop().await;

        let value = assert_ok!(read(&state, CONNECTION_URI).await);
        let text = text(&value);
        assert!(text.contains("Connection Status: Disconnected"));
        assert!(text.contains(&ErrorKind::Connectivity.to_string()));
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let script = Script::new();
        let state = scripted(&script).await;
        let err = assert_err!(read(&state, "neo4j://secrets").await);
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }
}
