//! Query requests, statements and results

use neo4j_mcp_types::{AccessMode, QueryMode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GraphValue;

/// A query submitted by a caller
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub parameters: Map<String, Value>,
    /// Target database; `None` uses the configured default
    pub database: Option<String>,
    pub mode: QueryMode,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, mode: impl Into<QueryMode>) -> Self {
        Self {
            query: query.into(),
            parameters: Map::new(),
            database: None,
            mode: mode.into(),
        }
    }

    pub fn read(query: impl Into<String>) -> Self {
        Self::new(query, AccessMode::Read)
    }

    pub fn write(query: impl Into<String>) -> Self {
        Self::new(query, AccessMode::Write)
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn on_database(mut self, database: Option<String>) -> Self {
        self.database = database.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode.access_mode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StatementText {
    Internal(&'static str),
    Caller(String),
}

/// Statement text plus parameters, as handed to a backend session
///
/// Only two sources of text exist: compile-time constants for the server's own
/// statements and the caller's query text. Values always travel in the
/// parameter map.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: StatementText,
    parameters: Map<String, Value>,
}

impl Statement {
    /// One of the server's own statements
    pub fn internal(text: &'static str) -> Self {
        Self {
            text: StatementText::Internal(text),
            parameters: Map::new(),
        }
    }

    /// The caller's query, verbatim, with its parameters
    pub fn from_request(request: &QueryRequest) -> Self {
        Self {
            text: StatementText::Caller(request.query.clone()),
            parameters: request.parameters.clone(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        match &self.text {
            StatementText::Internal(text) => text,
            StatementText::Caller(text) => text,
        }
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.text, StatementText::Internal(_))
    }
}

/// Update counters reported by the server for one statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCounters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
    pub indexes_added: u64,
    pub indexes_removed: u64,
    pub constraints_added: u64,
    pub constraints_removed: u64,
}

impl QueryCounters {
    /// Returns true if any counter reports a change to the graph or schema
    pub fn contains_updates(&self) -> bool {
        [
            self.nodes_created,
            self.nodes_deleted,
            self.relationships_created,
            self.relationships_deleted,
            self.properties_set,
            self.labels_added,
            self.labels_removed,
            self.indexes_added,
            self.indexes_removed,
            self.constraints_added,
            self.constraints_removed,
        ]
        .iter()
        .any(|count| *count > 0)
    }
}

/// What a backend session returns for one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub columns: Vec<String>,
    /// One entry per record, aligned with `columns`
    pub rows: Vec<Vec<GraphValue>>,
    /// `None` when the backend cannot report counters
    pub counters: Option<QueryCounters>,
}

impl RawResult {
    /// Values of one column across all rows
    pub fn column(&self, name: &str) -> impl Iterator<Item = &GraphValue> {
        let index = self.columns.iter().position(|c| c == name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)))
    }
}

/// Shaped, serialisable result of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub records: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<QueryCounters>,
}

impl QueryResult {
    pub fn count(&self) -> usize {
        self.records.len()
    }
}
