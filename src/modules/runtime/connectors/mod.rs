//! Graph database connectors
//!
//! This module provides the blocking connector seam, the neo4rs-backed
//! implementation, and the connection manager that owns the live handle.

mod manager;
mod neo4j;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::{ConnectionManager, ScopedSession};
pub use neo4j::{Neo4jConnector, Neo4jConnectorFactory};
pub use traits::{Connector, ConnectorFactory, Session};
