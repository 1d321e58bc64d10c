//! JSON records reader and writer
//!
//! Accepts an array of objects (`json`) or one object per line (`jsonl`).
//! Column order follows the first appearance of each key; a key missing from
//! a record is null in that row.

use crate::ingest::columnar::project;
use crate::ingest::{IngestError, ReadOptions};
use crate::models::{ColumnType, Scalar, Table};
use serde_json::{Map, Value};
use std::io::{BufRead, Read, Write};

pub type Record = Map<String, Value>;

/// Read a JSON array of records
pub fn read_json<R: Read>(reader: R, options: &ReadOptions) -> Result<Table, IngestError> {
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = value else {
        return Err(IngestError::parse(
            "document root",
            "expected an array of records; use the jsonl format for one record per line",
        ));
    };
    let records = items
        .into_iter()
        .take(options.limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, item)| into_record(item, format!("record {}", index)))
        .collect::<Result<Vec<_>, _>>()?;
    records_to_table(records, options)
}

/// Read newline-delimited records; blank lines are skipped
pub fn read_json_lines<R: BufRead>(reader: R, options: &ReadOptions) -> Result<Table, IngestError> {
    let limit = options.limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        if records.len() >= limit {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let location = format!("line {}", number + 1);
        let value: Value = serde_json::from_str(&line)
            .map_err(|e| IngestError::parse(location.clone(), e.to_string()))?;
        records.push(into_record(value, location)?);
    }
    records_to_table(records, options)
}

fn into_record(value: Value, location: String) -> Result<Record, IngestError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(IngestError::parse(
            location,
            format!("expected an object, found {}", kind_name(&other)),
        )),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Column type implied by one value, `None` for null
fn value_type(column: &str, value: &Value) -> Result<Option<ColumnType>, IngestError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(_) => Ok(Some(ColumnType::Boolean)),
        Value::Number(n) if n.is_i64() => Ok(Some(ColumnType::Int64)),
        Value::Number(_) => Ok(Some(ColumnType::Float64)),
        Value::String(_) => Ok(Some(ColumnType::Utf8)),
        nested => Err(IngestError::unsupported_type(column, kind_name(nested))),
    }
}

fn merge_types(column: &str, current: Option<ColumnType>, next: ColumnType) -> Result<ColumnType, IngestError> {
    match current {
        None => Ok(next),
        Some(current) if current == next => Ok(current),
        Some(current) if current.is_numeric() && next.is_numeric() => Ok(ColumnType::Float64),
        Some(current) => Err(IngestError::MixedTypes {
            column: column.to_string(),
            first: current.name().to_string(),
            second: next.name().to_string(),
        }),
    }
}

fn to_scalar(value: Option<&Value>) -> Scalar {
    match value {
        None | Some(Value::Null) => Scalar::Null,
        Some(Value::Bool(b)) => Scalar::Bool(*b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Scalar::Int(i),
            None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
        },
        Some(Value::String(s)) => Scalar::Text(s.clone()),
        Some(_) => Scalar::Null,
    }
}

/// Build a table from in-memory records
pub fn records_to_table(records: Vec<Record>, options: &ReadOptions) -> Result<Table, IngestError> {
    let mut names: Vec<String> = Vec::new();
    let mut types: Vec<Option<ColumnType>> = Vec::new();
    for record in &records {
        for (key, value) in record {
            let position = match names.iter().position(|n| n == key) {
                Some(position) => position,
                None => {
                    names.push(key.clone());
                    types.push(None);
                    names.len() - 1
                }
            };
            if let Some(ty) = value_type(key, value)? {
                types[position] = Some(merge_types(key, types[position], ty)?);
            }
        }
    }
    if names.is_empty() {
        return Err(IngestError::parse(
            "document",
            "no records with fields were found",
        ));
    }

    let columns = names
        .iter()
        .zip(&types)
        .map(|(name, ty)| {
            let ty = ty.unwrap_or(ColumnType::Utf8);
            let values = records.iter().map(|r| to_scalar(r.get(name))).collect();
            (name.clone(), ty, values)
        })
        .collect();
    let table = Table::from_scalars(columns)?;

    match &options.columns {
        Some(columns) => project(table, columns),
        None => Ok(table),
    }
}

/// Write records as a JSON array (`lines = false`) or JSON lines
pub fn write_json<W: Write>(table: &Table, mut writer: W, lines: bool) -> Result<(), IngestError> {
    let records = table.to_rows().to_records();
    if lines {
        for record in &records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
    } else {
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
