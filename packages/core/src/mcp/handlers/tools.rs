//! MCP Tools Handler
//!
//! Implements MCP-compliant tools/list and tools/call methods, and the tool
//! dispatch table shared with direct method calls.

use crate::mcp::handlers::{io, relational, tables};
use crate::mcp::types::MCPError;
use crate::services::DataService;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Every tool the server exposes, in tools/list order
pub const TOOL_NAMES: &[&str] = &[
    "read_csv",
    "read_parquet",
    "read_json",
    "from_records",
    "to_csv",
    "to_parquet",
    "to_json",
    "list_data",
    "data_info",
    "get_data",
    "drop_data",
    "clear_data",
    "memory_usage",
    "check_row_limit",
    "filter",
    "select",
    "groupby",
    "join",
    "sort",
    "head",
    "tail",
    "describe",
];

pub fn is_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// Run one tool and return its raw result
pub async fn call_tool(
    service: &Arc<DataService>,
    tool_name: &str,
    arguments: Value,
) -> Result<Value, MCPError> {
    debug!("🔧 Calling tool '{}'", tool_name);
    match tool_name {
        // Ingest / export
        "read_csv" => io::handle_read_csv(service, arguments).await,
        "read_parquet" => io::handle_read_parquet(service, arguments).await,
        "read_json" => io::handle_read_json(service, arguments).await,
        "from_records" => io::handle_from_records(service, arguments).await,
        "to_csv" => io::handle_to_csv(service, arguments).await,
        "to_parquet" => io::handle_to_parquet(service, arguments).await,
        "to_json" => io::handle_to_json(service, arguments).await,

        // Registry
        "list_data" => tables::handle_list_data(service, arguments).await,
        "data_info" => tables::handle_data_info(service, arguments).await,
        "get_data" => tables::handle_get_data(service, arguments).await,
        "drop_data" => tables::handle_drop_data(service, arguments).await,
        "clear_data" => tables::handle_clear_data(service, arguments).await,
        "memory_usage" => tables::handle_memory_usage(service, arguments).await,
        "check_row_limit" => tables::handle_check_row_limit(service, arguments).await,

        // Relational operations
        "filter" => relational::handle_filter(service, arguments).await,
        "select" => relational::handle_select(service, arguments).await,
        "groupby" => relational::handle_groupby(service, arguments).await,
        "join" => relational::handle_join(service, arguments).await,
        "sort" => relational::handle_sort(service, arguments).await,
        "head" => relational::handle_head(service, arguments).await,
        "tail" => relational::handle_tail(service, arguments).await,
        "describe" => relational::handle_describe(service, arguments).await,

        _ => Err(MCPError::invalid_params(format!(
            "Unknown tool: {}",
            tool_name
        ))),
    }
}

/// Handle tools/list MCP request
///
/// Response format:
/// ```json
/// { "tools": [ { "name": "...", "description": "...", "inputSchema": { ... } } ] }
/// ```
pub fn handle_tools_list(_params: Value) -> Result<Value, MCPError> {
    Ok(json!({
        "tools": get_tool_schemas()
    }))
}

/// Handle tools/call MCP request
///
/// Tool failures are returned as a successful response with `isError: true`
/// and a JSON text body `{"error", "kind", "suggestion"}`, so the agent can
/// read and react to them. Only a malformed call (missing or unknown tool
/// name) is a JSON-RPC error.
pub async fn handle_tools_call(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let tool_name = params["name"]
        .as_str()
        .ok_or_else(|| MCPError::invalid_params("Missing 'name' parameter".to_string()))?;
    if !is_tool(tool_name) {
        return Err(MCPError::invalid_params(format!(
            "Unknown tool: {}",
            tool_name
        )));
    }

    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let (body, is_error) = match call_tool(service, tool_name, arguments).await {
        Ok(data) => (data, false),
        Err(e) => (e.payload(), true),
    };
    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| MCPError::internal_error(format!("JSON serialization failed: {}", e)))?;

    Ok(json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "isError": is_error
    }))
}

fn name_property() -> Value {
    json!({
        "type": "string",
        "description": "Optional handle for the result; must not already exist. A df_xxxxxxxx handle is generated when omitted"
    })
}

fn data_ref_property() -> Value {
    json!({
        "type": "string",
        "description": "Handle of a stored table"
    })
}

fn string_or_list(description: &str) -> Value {
    json!({
        "oneOf": [
            { "type": "string" },
            { "type": "array", "items": { "type": "string" } }
        ],
        "description": description
    })
}

/// JSON schemas for every tool in [`TOOL_NAMES`]
fn get_tool_schemas() -> Value {
    let read_common = json!({
        "file_path": {
            "type": "string",
            "description": "Path to the file. Relative paths are searched in the working directory, then the configured project directories"
        },
        "name": name_property(),
        "columns": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Only read these columns, in this order"
        },
        "limit": {
            "type": "integer",
            "minimum": 0,
            "description": "Read at most this many rows"
        }
    });
    let with_common = |extra: Value| -> Value {
        let mut properties = read_common.clone();
        if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
            target.extend(extra);
        }
        properties
    };

    json!([
        {
            "name": "read_csv",
            "description": "Load a CSV (or .tsv) file into a new table. Column types are inferred: boolean, int64, float64, timestamp, else utf8. Empty, NA, NaN and null cells are missing values",
            "inputSchema": {
                "type": "object",
                "properties": with_common(json!({
                    "delimiter": {
                        "type": "string",
                        "description": "Single-character field delimiter (default ',' or tab for .tsv); '\\t' means tab"
                    }
                })),
                "required": ["file_path"]
            }
        },
        {
            "name": "read_parquet",
            "description": "Load a Parquet file into a new table. Narrow numeric types are widened to int64/float64 and dates to timestamps",
            "inputSchema": {
                "type": "object",
                "properties": with_common(json!({})),
                "required": ["file_path"]
            }
        },
        {
            "name": "read_json",
            "description": "Load a JSON array of records, or JSON lines (one record per line), into a new table",
            "inputSchema": {
                "type": "object",
                "properties": with_common(json!({
                    "lines": {
                        "type": "boolean",
                        "description": "Read one record per line; inferred from a .jsonl/.ndjson extension when omitted"
                    }
                })),
                "required": ["file_path"]
            }
        },
        {
            "name": "from_records",
            "description": "Create a table from records passed inline, e.g. [{\"id\": 1, \"city\": \"Oslo\"}]",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "records": {
                        "type": "array",
                        "items": { "type": "object" },
                        "description": "Records with scalar values; keys become columns in first-seen order"
                    },
                    "name": name_property()
                },
                "required": ["records"]
            }
        },
        {
            "name": "to_csv",
            "description": "Write a table to a CSV file (tab separated for .tsv). Missing values are written as empty cells",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "file_path": {
                        "type": "string",
                        "description": "Destination; relative paths go to the first project directory"
                    },
                    "delimiter": {
                        "type": "string",
                        "description": "Single-character field delimiter"
                    }
                },
                "required": ["data_ref", "file_path"]
            }
        },
        {
            "name": "to_parquet",
            "description": "Write a table to a Snappy-compressed Parquet file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "file_path": { "type": "string", "description": "Destination path" }
                },
                "required": ["data_ref", "file_path"]
            }
        },
        {
            "name": "to_json",
            "description": "Write a table as a JSON array of records, or JSON lines",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "file_path": { "type": "string", "description": "Destination path" },
                    "lines": {
                        "type": "boolean",
                        "description": "Write one record per line; inferred from the extension when omitted"
                    }
                },
                "required": ["data_ref", "file_path"]
            }
        },
        {
            "name": "list_data",
            "description": "List stored tables in creation order with row/column counts and memory",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "data_info",
            "description": "Metadata of one table: row and column counts, column names and types, memory, source and creation time",
            "inputSchema": {
                "type": "object",
                "properties": { "data_ref": data_ref_property() },
                "required": ["data_ref"]
            }
        },
        {
            "name": "get_data",
            "description": "Read rows of a table as records",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "offset": { "type": "integer", "minimum": 0, "description": "First row (default 0)" },
                    "limit": { "type": "integer", "minimum": 0, "description": "Maximum rows (default 100)" }
                },
                "required": ["data_ref"]
            }
        },
        {
            "name": "drop_data",
            "description": "Remove a table. Returns dropped=false if it did not exist",
            "inputSchema": {
                "type": "object",
                "properties": { "data_ref": data_ref_property() },
                "required": ["data_ref"]
            }
        },
        {
            "name": "clear_data",
            "description": "Remove every stored table",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "memory_usage",
            "description": "Estimated memory of every stored table and the total",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "check_row_limit",
            "description": "Check a row count against the configured row limit before loading",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "row_count": { "type": "integer", "minimum": 0, "description": "Proposed number of rows" }
                },
                "required": ["row_count"]
            }
        },
        {
            "name": "filter",
            "description": "Keep the rows where a condition holds, as a new table. Example: \"value > 25 and city in ['Oslo', 'Bergen']\"",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "condition": {
                        "type": "string",
                        "description": "Boolean expression over column names: == != < <= > >=, in [..], not in [..], and, or, not, + - * / %. Backticks quote odd column names"
                    },
                    "name": name_property()
                },
                "required": ["data_ref", "condition"]
            }
        },
        {
            "name": "select",
            "description": "Keep the named columns, in the given order, as a new table",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "columns": { "type": "array", "items": { "type": "string" } },
                    "name": name_property()
                },
                "required": ["data_ref", "columns"]
            }
        },
        {
            "name": "groupby",
            "description": "Group rows and aggregate. Functions: sum, mean, count, min, max, median, std, first, last, nunique. Rows with a missing group value are dropped",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "by": string_or_list("Group column(s)"),
                    "agg": {
                        "type": "object",
                        "description": "Column to function name or list of names, e.g. {\"sales\": [\"sum\", \"mean\"], \"id\": \"count\"}",
                        "additionalProperties": {
                            "oneOf": [
                                { "type": "string" },
                                { "type": "array", "items": { "type": "string" } }
                            ]
                        }
                    },
                    "name": name_property()
                },
                "required": ["data_ref", "by", "agg"]
            }
        },
        {
            "name": "join",
            "description": "Join two tables on key columns. Key columns appear once; other clashing names get _x/_y suffixes",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "left_ref": { "type": "string", "description": "Handle of the left table" },
                    "right_ref": { "type": "string", "description": "Handle of the right table" },
                    "on": string_or_list("Key column(s); defaults to the columns both tables share"),
                    "how": {
                        "type": "string",
                        "enum": ["inner", "left", "right", "outer"],
                        "description": "Join type (default inner)"
                    },
                    "name": name_property()
                },
                "required": ["left_ref", "right_ref"]
            }
        },
        {
            "name": "sort",
            "description": "Sort rows by one or more columns (stable, missing values last) as a new table",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "by": string_or_list("Sort column(s)"),
                    "ascending": {
                        "oneOf": [
                            { "type": "boolean" },
                            { "type": "array", "items": { "type": "boolean" } }
                        ],
                        "description": "One flag for all columns or one per column (default true)"
                    },
                    "name": name_property()
                },
                "required": ["data_ref", "by"]
            }
        },
        {
            "name": "head",
            "description": "First n rows as a new table",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "n": { "type": "integer", "minimum": 0, "description": "Row count (default 5)" },
                    "name": name_property()
                },
                "required": ["data_ref"]
            }
        },
        {
            "name": "tail",
            "description": "Last n rows as a new table",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "n": { "type": "integer", "minimum": 0, "description": "Row count (default 5)" },
                    "name": name_property()
                },
                "required": ["data_ref"]
            }
        },
        {
            "name": "describe",
            "description": "Summary statistics (count, mean, std, min, quartiles, max) of the numeric columns as a new table",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "data_ref": data_ref_property(),
                    "name": name_property()
                },
                "required": ["data_ref"]
            }
        }
    ])
}

// Include tests
#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;
