//! Query execution module
//!
//! Enforces the read/write contract, runs the caller's query on a borrowed
//! session and shapes the records.

mod guard;
mod shaping;

pub use guard::find_write_clause;
pub use shaping::{shape, to_json, MAX_SAFE_INTEGER};

use neo4j_mcp_core::{NormalizedError, QueryRequest, QueryResult, Statement};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::connectors::ConnectionManager;

/// Runs one caller query per call; no transaction spans two calls
pub struct QueryExecutor {
    connections: Arc<ConnectionManager>,
}

impl QueryExecutor {
    /// Create a new query executor
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Execute a query with the caller-declared access mode
    ///
    /// Read-mode queries containing a write clause are rejected before they
    /// reach the database. Read sessions are always rolled back, and a read
    /// that still reports updates fails with `AccessModeViolation`.
    pub async fn execute(&self, request: QueryRequest) -> Result<QueryResult, NormalizedError> {
        if request.query.trim().is_empty() {
            return Err(NormalizedError::query("Query text is empty"));
        }

        let mode = request.access_mode();
        if mode.is_read() {
            if let Some(keyword) = find_write_clause(&request.query) {
                return Err(NormalizedError::access_mode(format!(
                    "Query contains the write clause {} but was submitted as read-only; \
                     use run_write_query or run_query with read_only=false",
                    keyword
                )));
            }
        }

        debug!(
            mode = %mode,
            database = request.database.as_deref().unwrap_or("<default>"),
            query = %request.query,
            "Executing query"
        );

        let statement = Statement::from_request(&request);
        let started = Instant::now();
        let raw = self
            .connections
            .with_session(request.database.as_deref(), mode, move |session| {
                let raw = session.run(&statement)?;
                let updated = raw.counters.map_or(false, |c| c.contains_updates());
                if session.mode().is_read() && updated {
                    return Err(NormalizedError::access_mode(
                        "Read-only query reported updates; the transaction was rolled back",
                    ));
                }
                Ok(raw)
            })
            .await?;

        let result = shape(raw);
        info!(
            mode = %mode,
            rows = result.count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(result)
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }
}
