//! Connection diagnostics

use neo4j_mcp_core::{ConnectionDescriptor, ConnectionReport, ServerInfo, Statement};
use neo4j_mcp_types::AccessMode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::connectors::ConnectionManager;

const PING: &str = "RETURN 1 AS ok";

/// Reports whether the database answers, and what it is
pub struct ConnectionDiagnostics {
    connections: Arc<ConnectionManager>,
    database: String,
    auth_enabled: bool,
}

impl ConnectionDiagnostics {
    pub fn new(connections: Arc<ConnectionManager>, descriptor: &ConnectionDescriptor) -> Self {
        Self {
            connections,
            database: descriptor.database().to_string(),
            auth_enabled: descriptor.auth_enabled(),
        }
    }

    /// Run a trivial read and collect server metadata
    ///
    /// Never fails: problems are embedded in the report with `ok=false`.
    pub async fn test_connection(&self) -> ConnectionReport {
        let outcome = self
            .connections
            .with_session(None, AccessMode::Read, |session| {
                let started = Instant::now();
                session.run(&Statement::internal(PING))?;
                let latency = started.elapsed();

                let info = match session.server_info() {
                    Ok(info) => info,
                    Err(err) => {
                        debug!("Server components unavailable: {}", err);
                        ServerInfo::default()
                    }
                };
                Ok((latency, info))
            })
            .await;

        match outcome {
            Ok((latency, info)) => {
                let report =
                    ConnectionReport::success(&self.database, self.auth_enabled, latency, info);
                info!(
                    latency_ms = report.latency_ms.unwrap_or_default(),
                    version = report.server_version.as_deref().unwrap_or("unknown"),
                    "Connection test succeeded"
                );
                report
            }
            Err(err) => {
                warn!("Connection test failed: {}", err);
                ConnectionReport::failure(&self.database, self.auth_enabled, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::testing::Script;
    use neo4j_mcp_core::{
        ConnectionSettings, DriverFailure, ErrorKind, ServerComponent,
    };
    use tokio_test::assert_ok;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new(ConnectionSettings {
            username: Some("neo4j".into()),
            password: Some("password".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_connection_ok() {
        let script = Script::new();
        script.set_server(ServerInfo::from_components(vec![ServerComponent {
            name: "Neo4j Kernel".into(),
            versions: vec!["5.26.1".into()],
            edition: "enterprise".into(),
        }]));
        let manager = Arc::new(ConnectionManager::new(script.factory()));
        assert_ok!(manager.start(descriptor()).await);

        let report = ConnectionDiagnostics::new(manager, &descriptor())
            .test_connection()
            .await;
        assert!(report.ok);
        assert_eq!(report.server_version.as_deref(), Some("5.26.1"));
        assert_eq!(report.server_edition.as_deref(), Some("enterprise"));
        assert!(report.latency_ms.is_some());
        assert!(report.auth_enabled);
        assert!(report.error.is_none());
        assert_eq!(script.people(), 0);
    }

    #[tokio::test]
    async fn test_connection_not_started_reports_instead_of_failing() {
        let script = Script::new();
        let manager = Arc::new(ConnectionManager::new(script.factory()));

        let report = ConnectionDiagnostics::new(manager, &descriptor())
            .test_connection()
            .await;
        assert!(!report.ok);
        assert_eq!(report.error.unwrap().kind, ErrorKind::Connectivity);
        assert_eq!(script.connects(), 0);
    }

    #[tokio::test]
    async fn test_connection_query_failure() {
        let script = Script::new();
        script.fail_statement(
            PING,
            DriverFailure::ServiceUnavailable("connection reset by peer".into()),
        );
        let manager = Arc::new(ConnectionManager::new(script.factory()));
        assert_ok!(manager.start(descriptor()).await);

        let report = ConnectionDiagnostics::new(manager, &descriptor())
            .test_connection()
            .await;
        assert!(!report.ok);
        let err = report.error.unwrap();
        assert_eq!(err.kind, ErrorKind::Connectivity);
        assert!(err.message.contains("check NEO4J_HOST/NEO4J_PORT"));
    }
}
