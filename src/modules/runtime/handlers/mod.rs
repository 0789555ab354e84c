//! Request handlers for the MCP server
//!
//! This module contains the JSON-RPC dispatcher shared by both transports,
//! and the tools, resources and prompts it exposes.

mod mcp;
pub mod prompts;
pub mod resources;
pub mod tools;

pub use mcp::McpHandler;
