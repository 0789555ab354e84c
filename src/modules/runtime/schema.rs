//! Schema introspection

use neo4j_mcp_core::{
    ErrorKind, GraphValue, NormalizedError, RawResult, SchemaSnapshot, Statement,
};
use neo4j_mcp_types::AccessMode;
use std::sync::Arc;
use tracing::{debug, info};

use crate::connectors::{ConnectionManager, ScopedSession};

const LABELS: &str = "CALL db.labels() YIELD label RETURN label ORDER BY label";
const RELATIONSHIP_TYPES: &str = "CALL db.relationshipTypes() YIELD relationshipType \
                                  RETURN relationshipType ORDER BY relationshipType";
const PROPERTY_KEYS: &str =
    "CALL db.propertyKeys() YIELD propertyKey RETURN propertyKey ORDER BY propertyKey";
const NODE_COUNTS: &str =
    "MATCH (n) UNWIND labels(n) AS label RETURN label, count(*) AS count ORDER BY label";

/// Builds schema snapshots from a fixed battery of metadata queries
pub struct SchemaIntrospector {
    connections: Arc<ConnectionManager>,
}

impl SchemaIntrospector {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Take a fresh snapshot of `database` (or the configured default)
    ///
    /// All four statements run in order on one read session. The first
    /// failing statement aborts the snapshot with `QueryError`.
    pub async fn get_schema(
        &self,
        database: Option<&str>,
    ) -> Result<SchemaSnapshot, NormalizedError> {
        let snapshot = self
            .connections
            .with_session(database, AccessMode::Read, |session| {
                let mut snapshot = SchemaSnapshot::new(session.database());

                let labels = step(session, "labels", LABELS)?;
                snapshot.labels = strings(&labels, "label").collect();

                let rel_types = step(session, "relationship types", RELATIONSHIP_TYPES)?;
                snapshot.relationship_types = strings(&rel_types, "relationshipType").collect();

                let keys = step(session, "property keys", PROPERTY_KEYS)?;
                snapshot.property_keys = strings(&keys, "propertyKey").collect();

                let counts = step(session, "node counts", NODE_COUNTS)?;
                let label_index = counts.columns.iter().position(|c| c == "label");
                let count_index = counts.columns.iter().position(|c| c == "count");
                if let (Some(li), Some(ci)) = (label_index, count_index) {
                    for row in &counts.rows {
                        if let (Some(GraphValue::String(label)), Some(GraphValue::Integer(count))) =
                            (row.get(li), row.get(ci))
                        {
                            snapshot
                                .node_counts
                                .insert(label.clone(), (*count).max(0) as u64);
                        }
                    }
                }

                Ok(snapshot)
            })
            .await?;

        info!(
            database = %snapshot.database,
            labels = snapshot.labels.len(),
            relationship_types = snapshot.relationship_types.len(),
            property_keys = snapshot.property_keys.len(),
            "Schema introspected"
        );
        Ok(snapshot)
    }
}

fn step(
    session: &mut ScopedSession<'_>,
    name: &str,
    text: &'static str,
) -> Result<RawResult, NormalizedError> {
    debug!(step = name, "Running schema statement");
    session.run(&Statement::internal(text)).map_err(|err| NormalizedError {
        kind: ErrorKind::QueryError,
        message: format!("Schema introspection failed while reading {}: {}", name, err.message),
        retryable: err.retryable,
    })
}

fn strings<'a>(raw: &'a RawResult, column: &'a str) -> impl Iterator<Item = String> + 'a {
    raw.column(column)
        .filter_map(|value| value.as_str().map(str::to_string))
}
