//! MCP (Model Context Protocol) server library.
//!
//! This crate provides the JSON-RPC 2.0 wire types and a line-delimited
//! server loop. Applications plug in a [`Handler`] that supplies the tool
//! catalogue and executes tool calls.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolParams, CallToolResult, Handler, Server, ServerInfo, Tool};
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     fn server_info(&self) -> ServerInfo {
//!         ServerInfo { name: "hello".into(), version: "0.1.0".into() }
//!     }
//!
//!     fn list_tools(&self) -> Vec<Tool> {
//!         Vec::new()
//!     }
//!
//!     async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
//!         CallToolResult::error(format!("Unknown tool: {}", params.name))
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! Server::new(Hello).serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo,
    Tool, ToolContent, ToolsCapability,
};
pub use server::{Handler, MAX_LINE_SIZE, Server};
