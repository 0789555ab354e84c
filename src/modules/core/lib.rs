//! Core domain logic for neo4j-mcp
//!
//! This crate contains the domain model (connection descriptor, queries,
//! results, schema snapshots), the error taxonomy, and the error normalizer
//! that maps every driver failure onto it.

pub mod domain;
pub mod error;
pub mod normalize;

pub use domain::*;
pub use error::{ErrorKind, Neo4jMcpError, NormalizedError};
pub use normalize::{normalize, DriverFailure, Redactor};
