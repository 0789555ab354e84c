//! Shared runtime application state

use chrono::{DateTime, Utc};
use neo4j_mcp_core::ConnectionDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::connectors::ConnectionManager;
use crate::diagnostics::ConnectionDiagnostics;
use crate::executor::QueryExecutor;
use crate::schema::SchemaIntrospector;

/// `Mcp-Session-Id` header name (Streamable HTTP transport).
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Latest protocol version supported by this server.
pub const MCP_LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

/// Protocol versions a client may negotiate.
pub const MCP_SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// Sessions unused for this long are forgotten.
pub const MCP_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Application state shared by both transports.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    pub schema: Arc<SchemaIntrospector>,
    pub diagnostics: Arc<ConnectionDiagnostics>,
    pub descriptor: Arc<ConnectionDescriptor>,
    pub mcp_sessions: Arc<McpSessions>,
}

impl AppState {
    pub fn new(connections: Arc<ConnectionManager>, descriptor: ConnectionDescriptor) -> Self {
        Self {
            executor: Arc::new(QueryExecutor::new(connections.clone())),
            schema: Arc::new(SchemaIntrospector::new(connections.clone())),
            diagnostics: Arc::new(ConnectionDiagnostics::new(connections, &descriptor)),
            descriptor: Arc::new(descriptor),
            mcp_sessions: Arc::new(McpSessions::new()),
        }
    }
}

/// One HTTP client session
#[derive(Debug, Clone)]
pub struct McpSession {
    pub created_at: DateTime<Utc>,
    pub protocol_version: String,
}

struct SessionEntry {
    session: Arc<McpSession>,
    last_seen: Instant,
}

/// In-memory MCP session store.
///
/// Sessions expire after sitting idle for the configured TTL; expired ones
/// are dropped lazily whenever a session is created or looked up.
pub struct McpSessions {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_ttl: Duration,
}

impl Default for McpSessions {
    fn default() -> Self {
        Self::with_idle_ttl(MCP_SESSION_IDLE_TTL)
    }
}

impl McpSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub async fn create(&self, protocol_version: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut guard = self.sessions.write().await;
        self.prune(&mut guard, now);
        guard.insert(
            id.clone(),
            SessionEntry {
                session: Arc::new(McpSession {
                    created_at: Utc::now(),
                    protocol_version: protocol_version.to_string(),
                }),
                last_seen: now,
            },
        );
        id
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: &str) -> Option<Arc<McpSession>> {
        let now = Instant::now();
        let mut guard = self.sessions.write().await;
        self.prune(&mut guard, now);
        let entry = guard.get_mut(id)?;
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut guard = self.sessions.write().await;
        guard.remove(id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn prune(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "Expired idle MCP sessions");
        }
    }
}

/// State over a started scripted backend
#[cfg(test)]
pub(crate) async fn scripted(script: &Arc<crate::connectors::testing::Script>) -> AppState {
    let descriptor = ConnectionDescriptor::new(neo4j_mcp_core::ConnectionSettings::default())
        .expect("default settings are valid");
    let connections = Arc::new(ConnectionManager::new(script.factory()));
    connections
        .start(descriptor.clone())
        .await
        .expect("scripted backend starts");
    AppState::new(connections, descriptor)
}
