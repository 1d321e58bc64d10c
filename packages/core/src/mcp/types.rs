//! MCP Protocol Types
//!
//! JSON-RPC 2.0 request, response and error structures, plus the
//! application error codes used by the data platform.

use crate::services::DataServiceError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Application error codes (-32000 and below)
pub const TABLE_NOT_FOUND: i32 = -32000;
pub const DUPLICATE_HANDLE: i32 = -32001;
pub const INVALID_EXPRESSION: i32 = -32002;
pub const UNKNOWN_COLUMN: i32 = -32003;
pub const SCHEMA_MISMATCH: i32 = -32004;
pub const ROW_LIMIT_EXCEEDED: i32 = -32005;
pub const INGEST_FAILED: i32 = -32006;
pub const OPERATION_FAILED: i32 = -32007;
pub const TIMEOUT: i32 = -32008;

const JSONRPC_VERSION: &str = "2.0";

fn jsonrpc_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let version = String::deserialize(deserializer)?;
    if version != JSONRPC_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported jsonrpc version '{}', expected '2.0'",
            version
        )));
    }
    Ok(version)
}

/// JSON-RPC request, or a notification when `id` is absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPRequest {
    #[serde(deserialize_with = "jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl MCPRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: MCPError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: String) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: String) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: String) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal_error(message: String) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn table_not_found(handle: &str) -> Self {
        Self::new(TABLE_NOT_FOUND, format!("Table not found: '{}'", handle))
    }

    /// Structured payload returned to the agent inside a tool result
    pub fn payload(&self) -> Value {
        match &self.data {
            Some(data) => data.clone(),
            None => json!({ "error": self.message }),
        }
    }
}

impl From<DataServiceError> for MCPError {
    fn from(err: DataServiceError) -> Self {
        let kind = err.kind();
        let code = match kind {
            "NotFound" => TABLE_NOT_FOUND,
            "DuplicateHandle" | "InvalidHandle" => DUPLICATE_HANDLE,
            "InvalidExpression" => INVALID_EXPRESSION,
            "UnknownColumn" => UNKNOWN_COLUMN,
            "SchemaMismatch" => SCHEMA_MISMATCH,
            "RowLimitExceeded" => ROW_LIMIT_EXCEEDED,
            "Timeout" => TIMEOUT,
            "InternalError" | "TaskCancelled" => INTERNAL_ERROR,
            _ if matches!(err, DataServiceError::Ingest(_)) => INGEST_FAILED,
            _ => OPERATION_FAILED,
        };
        let message = err.to_string();
        let data = json!({
            "error": message,
            "kind": kind,
            "suggestion": err.suggestion(),
        });
        Self {
            code,
            message,
            data: Some(data),
        }
    }
}

// Include tests
#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
