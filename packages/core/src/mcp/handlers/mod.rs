//! MCP Request Handlers
//!
//! - `initialize` - handshake and capability discovery
//! - `tools` - tools/list schemas and tools/call dispatch
//! - `io` - file ingest and export
//! - `tables` - registry inspection and lifetime management
//! - `relational` - filter, select, groupby, join, sort, head, tail, describe

pub mod initialize;
pub mod io;
pub mod relational;
pub mod tables;
pub mod tools;

use crate::mcp::types::MCPError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Deserialize tool arguments
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, MCPError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| MCPError::invalid_params(format!("Invalid parameters: {}", e)))
}

pub(crate) fn to_result<T: Serialize>(value: T) -> Result<Value, MCPError> {
    serde_json::to_value(value)
        .map_err(|e| MCPError::internal_error(format!("Failed to serialize result: {}", e)))
}

/// A parameter that accepts a single value or a list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Single-byte field delimiter; accepts `\t` and `tab` for tabs
pub(crate) fn parse_delimiter(delimiter: Option<&str>) -> Result<Option<u8>, MCPError> {
    let Some(text) = delimiter else {
        return Ok(None);
    };
    match text {
        "\\t" | "tab" | "\t" => Ok(Some(b'\t')),
        _ if text.len() == 1 && text.is_ascii() => Ok(Some(text.as_bytes()[0])),
        _ => Err(MCPError::invalid_params(format!(
            "Invalid delimiter '{}': expected a single ASCII character",
            text
        ))),
    }
}
