//! Parquet reader and writer
//!
//! Column types are widened onto the supported set on read: narrower integers
//! become int64, float16/32 become float64, large and view strings become
//! utf8, and every timestamp unit or date becomes timestamp(µs).

use crate::ingest::{IngestError, ReadOptions};
use crate::models::{ColumnType, Table};
use arrow_array::{RecordBatch, RecordBatchReader};
use arrow_cast::cast::cast;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use arrow_select::concat::concat_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::sync::Arc;
use tracing::debug;

/// Supported type a Parquet column is read as, `None` if it has none
fn widened_type(data_type: &DataType) -> Option<ColumnType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Some(ColumnType::Int64),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => Some(ColumnType::Float64),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Some(ColumnType::Utf8),
        DataType::Dictionary(_, values) if widened_type(values) == Some(ColumnType::Utf8) => {
            Some(ColumnType::Utf8)
        }
        DataType::Boolean => Some(ColumnType::Boolean),
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            Some(ColumnType::Timestamp)
        }
        _ => None,
    }
}

pub fn read_parquet(file: File, options: &ReadOptions) -> Result<Table, IngestError> {
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    if let Some(limit) = options.limit {
        builder = builder.with_limit(limit);
    }
    let reader = builder.build()?;
    let source_schema = reader.schema();

    let mut targets = Vec::with_capacity(source_schema.fields().len());
    for field in source_schema.fields() {
        let ty = widened_type(field.data_type())
            .ok_or_else(|| IngestError::unsupported_type(field.name(), field.data_type().to_string()))?;
        targets.push(Field::new(field.name().clone(), ty.to_arrow(), true));
    }
    let schema: SchemaRef = Arc::new(Schema::new(targets));

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(widen_batch(&batch?, &schema)?);
    }
    debug!("Read {} parquet batches", batches.len());

    let combined = if batches.is_empty() {
        RecordBatch::new_empty(schema.clone())
    } else {
        concat_batches(&schema, &batches)?
    };
    let table = Table::from_batch(combined)?;

    match &options.columns {
        Some(columns) => project(table, columns),
        None => Ok(table),
    }
}

fn widen_batch(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch, IngestError> {
    let columns = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(column, field)| {
            if column.data_type() == field.data_type() {
                Ok(column.clone())
            } else {
                cast(column.as_ref(), field.data_type())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Keep `columns`, in that order
pub(crate) fn project(table: Table, columns: &[String]) -> Result<Table, IngestError> {
    let indices = columns
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| IngestError::UnknownColumn {
                column: name.clone(),
                available: table.column_names(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::from_batch(table.batch().project(&indices)?)?)
}

/// Write a table as a single Snappy-compressed row group stream
pub fn write_parquet(table: &Table, file: File) -> Result<(), IngestError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, table.schema(), Some(props))?;
    writer.write(table.batch())?;
    writer.close()?;
    Ok(())
}
