//! Runtime for neo4j-mcp
//!
//! This crate provides the Neo4j connection manager, query execution, schema
//! introspection and diagnostics, and the MCP server with its stdio and HTTP
//! transports.

pub mod connectors;
pub mod diagnostics;
pub mod executor;
pub mod handlers;
pub mod schema;
pub mod server;
pub mod state;

pub use connectors::{ConnectionManager, Connector, ConnectorFactory, Neo4jConnectorFactory};
pub use diagnostics::ConnectionDiagnostics;
pub use executor::QueryExecutor;
pub use handlers::McpHandler;
pub use schema::SchemaIntrospector;
pub use server::Runtime;
pub use state::AppState;
