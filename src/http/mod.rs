//! HTTP transport layer
//!
//! Provides the REST façade routes and the `/mcp` tool-call listener.

pub mod handlers;
