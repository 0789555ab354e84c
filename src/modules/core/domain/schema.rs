//! Schema snapshot

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Point-in-time description of a database's schema
///
/// Recomputed on every request; nothing is cached between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub database: String,
    pub labels: BTreeSet<String>,
    pub relationship_types: BTreeSet<String>,
    pub property_keys: BTreeSet<String>,
    /// Number of nodes carrying each label
    pub node_counts: BTreeMap<String, u64>,
}

impl SchemaSnapshot {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Node count for a label, zero when the label is unknown
    pub fn count_for(&self, label: &str) -> u64 {
        self.node_counts.get(label).copied().unwrap_or(0)
    }

    pub fn total_nodes_by_label(&self) -> u64 {
        self.node_counts.values().sum()
    }

    /// Human-readable rendering used by the `neo4j://schema` resource
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Neo4j Database Schema ({})", self.database);
        let _ = writeln!(out);

        let _ = writeln!(out, "Node Labels ({}):", self.labels.len());
        if self.labels.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for label in &self.labels {
            let _ = writeln!(out, "  - {} ({} nodes)", label, self.count_for(label));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Relationship Types ({}):", self.relationship_types.len());
        if self.relationship_types.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for rel_type in &self.relationship_types {
            let _ = writeln!(out, "  - {}", rel_type);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Property Keys ({}):", self.property_keys.len());
        if self.property_keys.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for key in &self.property_keys {
            let _ = writeln!(out, "  - {}", key);
        }

        out
    }
}
