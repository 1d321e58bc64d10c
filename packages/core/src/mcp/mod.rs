//! Model Context Protocol (MCP) Integration
//!
//! Stdio JSON-RPC 2.0 server exposing the data platform as MCP tools.
//!
//! # Architecture
//!
//! - **Shared DataService**: every handler works on one `Arc<DataService>`
//! - **stdio transport**: newline-delimited JSON-RPC over stdin/stdout
//! - **Concurrent requests**: each request runs in its own task
//!
//! # Usage
//!
//! Agents normally go through `tools/call`:
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "id": 1,
//!   "method": "tools/call",
//!   "params": {
//!     "name": "filter",
//!     "arguments": { "data_ref": "sales", "condition": "amount > 100" }
//!   }
//! }
//! ```
//!
//! Tool names are also accepted directly as methods (`"method": "filter"`),
//! in which case failures come back as JSON-RPC errors.

pub mod handlers;
pub mod server;
pub mod types;

pub use server::{handle_request, run_mcp_server, serve};
pub use types::{MCPError, MCPRequest, MCPResponse};
