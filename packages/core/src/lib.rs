//! Data Platform Core Business Logic Layer
//!
//! This crate provides the in-memory table registry, the relational operations
//! and the MCP tool layer that lets an AI agent load, transform and export
//! tabular data by handle.
//!
//! # Architecture
//!
//! - **Arrow-backed tables**: immutable columnar tables shared by `Arc`
//! - **Handle registry**: every table is addressed by a string handle
//! - **Derive, never mutate**: operations read tables and store new ones
//! - **stdio MCP**: JSON-RPC 2.0 server over stdin/stdout
//!
//! # Modules
//!
//! - [`models`] - Tables, column types, cell values and metadata
//! - [`datastore`] - Handle registry with memory accounting
//! - [`expression`] - Filter expression lexer, parser and evaluator
//! - [`operations`] - filter, select, group_by, join, sort, head/tail, describe
//! - [`ingest`] - CSV, Parquet and JSON readers and writers
//! - [`services`] - `DataService` orchestration and error mapping
//! - [`config`] - File and environment configuration
//! - [`mcp`] - MCP stdio server for AI agent integration

pub mod config;
pub mod datastore;
pub mod expression;
pub mod ingest;
pub mod mcp;
pub mod models;
pub mod operations;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{DataPlatformConfig, RowLimitPolicy};
pub use datastore::{RegistryError, TableRegistry};
pub use models::*;
pub use services::*;
