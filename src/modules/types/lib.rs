//! Type definitions for neo4j-mcp
//!
//! This crate contains shared type definitions used across the workspace,
//! including access modes, Bolt URI schemes, and JSON-RPC wire types.

pub mod access;
pub mod runtime;
pub mod scheme;
pub mod transport;

pub use access::{AccessMode, QueryMode};
pub use scheme::UriScheme;
pub use transport::Transport;
