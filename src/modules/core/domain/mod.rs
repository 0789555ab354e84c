//! Domain models for neo4j-mcp

mod descriptor;
mod diagnostics;
mod query;
mod schema;
mod value;

pub use descriptor::{defaults, ConnectionDescriptor, ConnectionSettings};
pub use diagnostics::{ConnectionReport, ServerComponent, ServerInfo};
pub use query::{QueryCounters, QueryRequest, QueryResult, RawResult, Statement};
pub use schema::SchemaSnapshot;
pub use value::{GraphValue, NodeValue, PathValue, PointValue, RelationshipValue};
