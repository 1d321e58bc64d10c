//! Business Services
//!
//! - `DataService` - ingest, export, relational operations and registry inspection
//! - `McpServerService` - lifecycle wrapper that serves a `DataService` over MCP stdio
//!
//! Services coordinate between the table registry and the protocol layer,
//! scheduling heavy work on the blocking pool and publishing results.

pub mod data_service;
pub mod error;
pub mod mcp_server_service;

pub use data_service::{
    DataPage, DataService, DerivedTable, ExportOutcome, LoadOutcome, MemoryUsage, TableMemory,
};
pub use error::DataServiceError;
pub use mcp_server_service::McpServerService;
