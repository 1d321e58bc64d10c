//! MCP Initialize Handler
//!
//! Version negotiation and the capability/instructions block sent back to a
//! connecting agent.

use crate::mcp::types::MCPError;
use serde_json::{json, Value};

/// Protocol versions this server speaks, newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

pub const SERVER_NAME: &str = "data-platform-mcp";

/// Usage notes surfaced to the agent at connect time
const INSTRUCTIONS: &[(&str, &str)] = &[
    (
        "handles",
        "Every table lives under a handle. Loading a file or running an operation returns a new handle (df_xxxxxxxx unless you pass 'name'); pass it as data_ref to later tools. Operations never modify their inputs.",
    ),
    (
        "filter",
        "Conditions use column names with == != < <= > >=, in [..], and/or/not and arithmetic, e.g. \"value > 25 and city in ['Oslo', 'Bergen']\". Quote odd column names with backticks.",
    ),
    (
        "limits",
        "Loads over the configured row limit return a warning (or fail if the server rejects them); use 'limit' or 'columns' to read less.",
    ),
    (
        "cleanup",
        "Tables stay in memory until drop_data or clear_data; check memory_usage on long sessions.",
    ),
];

/// Echo the client's version when supported, otherwise offer our newest.
///
/// The client decides whether it can continue with the offered version.
fn negotiate_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|supported| **supported == requested)
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// Handle MCP initialize request
///
/// After this the client sends `notifications/initialized` and may call
/// `tools/list`.
///
/// # Errors
///
/// Returns `invalid_params` if `protocolVersion` is missing or not a string
pub fn handle_initialize(params: Value) -> Result<Value, MCPError> {
    let requested = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .ok_or_else(|| MCPError::invalid_params("Missing protocolVersion parameter".to_string()))?;

    let instructions: serde_json::Map<String, Value> = INSTRUCTIONS
        .iter()
        .map(|(topic, text)| (topic.to_string(), Value::from(*text)))
        .collect();

    Ok(json!({
        "protocolVersion": negotiate_version(requested),
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "instructions": instructions
    }))
}

// Include tests
#[cfg(test)]
#[path = "initialize_test.rs"]
mod initialize_test;
