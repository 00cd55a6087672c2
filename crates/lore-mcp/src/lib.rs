//! Lore MCP - Model Context Protocol server over stdio.
//!
//! Speaks newline-delimited JSON-RPC 2.0 on stdin/stdout and exposes the
//! query service as tools. Nothing is ever logged to stdout.

mod error;
mod protocol;
mod server;
mod tools;

pub use error::{McpError, McpResult, ToolError, ToolErrorCode};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolDefinition, PROTOCOL_VERSION};
pub use server::{McpServer, QueryEmbedder};
pub use tools::tool_definitions;
