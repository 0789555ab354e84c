//! neo4j-mcp CLI
//!
//! This crate provides the command-line interface for the Neo4j MCP server:
//! - run: Start the server on stdio or HTTP
//! - check: Test the configured connection and print a report
//! - init: Write sample configuration files
//! - completion: Generate shell completions

pub mod commands;

pub use commands::{Cli, Commands, LogFormat};
