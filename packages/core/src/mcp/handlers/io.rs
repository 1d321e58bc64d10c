//! MCP Ingest and Export Handlers

use crate::ingest::records::Record;
use crate::ingest::{DataFormat, ReadOptions};
use crate::mcp::handlers::{parse_delimiter, parse_params, to_result};
use crate::mcp::types::MCPError;
use crate::services::DataService;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Parameters for read_csv
#[derive(Debug, Deserialize)]
pub struct ReadCsvParams {
    pub file_path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for read_parquet
#[derive(Debug, Deserialize)]
pub struct ReadParquetParams {
    pub file_path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for read_json
#[derive(Debug, Deserialize)]
pub struct ReadJsonParams {
    pub file_path: String,
    #[serde(default)]
    pub name: Option<String>,
    /// One record per line; inferred from the extension when absent
    #[serde(default)]
    pub lines: Option<bool>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Parameters for from_records
#[derive(Debug, Deserialize)]
pub struct FromRecordsParams {
    pub records: Vec<Record>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parameters for to_csv, to_parquet and to_json
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub data_ref: String,
    pub file_path: String,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub lines: Option<bool>,
}

fn json_format(path: &str, lines: Option<bool>) -> DataFormat {
    match lines {
        Some(true) => DataFormat::Jsonl,
        Some(false) => DataFormat::Json,
        None if DataFormat::from_path(Path::new(path)) == Some(DataFormat::Jsonl) => {
            DataFormat::Jsonl
        }
        None => DataFormat::Json,
    }
}

/// `.tsv` keeps tab separation; anything else is read as comma separated
fn delimited_format(path: &str) -> DataFormat {
    match DataFormat::from_path(Path::new(path)) {
        Some(DataFormat::Tsv) => DataFormat::Tsv,
        _ => DataFormat::Csv,
    }
}

pub async fn handle_read_csv(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: ReadCsvParams = parse_params(params)?;
    let options = ReadOptions {
        delimiter: parse_delimiter(params.delimiter.as_deref())?,
        columns: params.columns,
        limit: params.limit,
    };
    let format = delimited_format(&params.file_path);
    let outcome = service
        .load_file(&params.file_path, Some(format), options, params.name)
        .await?;
    to_result(outcome)
}

pub async fn handle_read_parquet(
    service: &Arc<DataService>,
    params: Value,
) -> Result<Value, MCPError> {
    let params: ReadParquetParams = parse_params(params)?;
    let options = ReadOptions {
        delimiter: None,
        columns: params.columns,
        limit: params.limit,
    };
    let outcome = service
        .load_file(&params.file_path, Some(DataFormat::Parquet), options, params.name)
        .await?;
    to_result(outcome)
}

pub async fn handle_read_json(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: ReadJsonParams = parse_params(params)?;
    let format = json_format(&params.file_path, params.lines);
    let options = ReadOptions {
        delimiter: None,
        columns: params.columns,
        limit: params.limit,
    };
    let outcome = service
        .load_file(&params.file_path, Some(format), options, params.name)
        .await?;
    to_result(outcome)
}

pub async fn handle_from_records(
    service: &Arc<DataService>,
    params: Value,
) -> Result<Value, MCPError> {
    let params: FromRecordsParams = parse_params(params)?;
    let outcome = service.load_records(params.records, params.name).await?;
    to_result(outcome.table)
}

pub async fn handle_to_csv(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: ExportParams = parse_params(params)?;
    let delimiter = parse_delimiter(params.delimiter.as_deref())?;
    let format = delimited_format(&params.file_path);
    let outcome = service
        .export(&params.data_ref, &params.file_path, Some(format), delimiter)
        .await?;
    to_result(outcome)
}

pub async fn handle_to_parquet(
    service: &Arc<DataService>,
    params: Value,
) -> Result<Value, MCPError> {
    let params: ExportParams = parse_params(params)?;
    let outcome = service
        .export(
            &params.data_ref,
            &params.file_path,
            Some(DataFormat::Parquet),
            None,
        )
        .await?;
    to_result(outcome)
}

pub async fn handle_to_json(service: &Arc<DataService>, params: Value) -> Result<Value, MCPError> {
    let params: ExportParams = parse_params(params)?;
    let format = json_format(&params.file_path, params.lines);
    let outcome = service
        .export(&params.data_ref, &params.file_path, Some(format), None)
        .await?;
    to_result(outcome)
}
