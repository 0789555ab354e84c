//! Connector trait definitions
//!
//! Backends expose blocking primitives only. The connection manager runs them
//! on the blocking worker pool and hands results back to async callers.

use neo4j_mcp_core::{ConnectionDescriptor, DriverFailure, RawResult, ServerInfo, Statement};
use neo4j_mcp_types::AccessMode;
use std::sync::Arc;

/// One borrowed session, used by exactly one operation at a time
pub trait Session: Send {
    /// Run one statement and buffer its records
    fn run(&mut self, statement: &Statement) -> Result<RawResult, DriverFailure>;

    /// Server version, edition and components
    fn server_info(&mut self) -> Result<ServerInfo, DriverFailure>;

    /// End the session, committing its work when `commit` is true and
    /// rolling it back otherwise
    fn finish(self: Box<Self>, commit: bool) -> Result<(), DriverFailure>;
}

/// A pooled, long-lived driver handle
pub trait Connector: Send + Sync {
    /// Borrow a session on `database` in the given access mode
    fn open_session(
        &self,
        database: &str,
        mode: AccessMode,
    ) -> Result<Box<dyn Session>, DriverFailure>;

    /// Check that the server is reachable and accepts the credentials
    fn verify(&self) -> Result<(), DriverFailure>;

    /// Close the connection and release resources
    fn close(&self) -> Result<(), DriverFailure>;

    /// Get the connector type name
    fn connector_type(&self) -> &'static str;
}

/// Builds connectors from a descriptor
pub trait ConnectorFactory: Send + Sync {
    fn connect(&self, descriptor: &ConnectionDescriptor)
        -> Result<Arc<dyn Connector>, DriverFailure>;
}
