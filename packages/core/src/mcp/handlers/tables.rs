//! MCP Registry Handlers
//!
//! Listing, inspection, paging and lifetime management of stored tables.

use crate::mcp::handlers::{parse_params, to_result};
use crate::mcp::types::MCPError;
use crate::services::DataService;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Parameters for tools that address one table
#[derive(Debug, Deserialize)]
pub struct DataRefParams {
    pub data_ref: String,
}

/// Parameters for get_data
#[derive(Debug, Deserialize)]
pub struct GetDataParams {
    pub data_ref: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_size")]
    pub limit: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Parameters for check_row_limit
#[derive(Debug, Deserialize)]
pub struct RowLimitParams {
    pub row_count: usize,
}

pub async fn handle_list_data(service: &Arc<DataService>, _params: Value) -> Result<Value, MCPError> {
    let tables: Vec<Value> = service
        .list()
        .await
        .into_iter()
        .map(|metadata| {
            json!({
                "handle": metadata.handle,
                "rows": metadata.row_count,
                "columns": metadata.column_count,
                "memory_mb": metadata.memory_mb(),
                "source": metadata.source,
            })
        })
        .collect();

    Ok(json!({
        "count": tables.len(),
        "tables": tables,
    }))
}

pub async fn handle_data_info(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: DataRefParams = parse_params(params)?;
    let metadata = service.info(&params.data_ref).await?;
    to_result(metadata)
}

pub async fn handle_get_data(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: GetDataParams = parse_params(params)?;
    let page = service
        .get_data(&params.data_ref, params.offset, Some(params.limit))
        .await?;
    to_result(page)
}

pub async fn handle_drop_data(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: DataRefParams = parse_params(params)?;
    let dropped = service.drop_table(&params.data_ref).await;
    Ok(json!({
        "handle": params.data_ref,
        "dropped": dropped,
    }))
}

pub async fn handle_clear_data(service: &Arc<DataService>, _params: Value) -> Result<Value, MCPError> {
    let cleared = service.clear().await;
    Ok(json!({ "cleared": cleared }))
}

pub async fn handle_memory_usage(
    service: &Arc<DataService>,
    _params: Value,
) -> Result<Value, MCPError> {
    to_result(service.memory_usage().await)
}

pub async fn handle_check_row_limit(
    service: &Arc<DataService>,
    params: Value,
) -> Result<Value, MCPError> {
    let params: RowLimitParams = parse_params(params)?;
    to_result(service.check_row_limit(params.row_count))
}
