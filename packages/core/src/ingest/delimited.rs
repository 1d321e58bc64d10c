//! Delimited text reader and writer

use crate::ingest::infer::{infer_column_type, parse_cell};
use crate::ingest::{IngestError, ReadOptions};
use crate::models::{build_array, Table};
use arrow_array::ArrayRef;
use std::io::{Read, Write};
use tracing::debug;

/// Read delimited text with a header row from any reader
pub fn read_csv<R: Read>(reader: R, delimiter: u8, options: &ReadOptions) -> Result<Table, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let selected: Vec<usize> = match &options.columns {
        Some(columns) => columns
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| IngestError::UnknownColumn {
                        column: name.clone(),
                        available: headers.clone(),
                    })
            })
            .collect::<Result<_, _>>()?,
        None => (0..headers.len()).collect(),
    };

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); selected.len()];
    let mut rows = 0;
    for record in reader.records() {
        if options.limit.is_some_and(|limit| rows >= limit) {
            break;
        }
        let record = record?;
        for (slot, &index) in selected.iter().enumerate() {
            cells[slot].push(record.get(index).unwrap_or_default().to_string());
        }
        rows += 1;
    }

    let mut columns: Vec<(String, ArrayRef)> = Vec::with_capacity(selected.len());
    for (slot, &index) in selected.iter().enumerate() {
        let column = &cells[slot];
        let ty = infer_column_type(column.iter().map(String::as_str));
        let values = column.iter().map(|cell| parse_cell(cell, ty));
        debug!("CSV column '{}' inferred as {}", headers[index], ty);
        columns.push((headers[index].clone(), build_array(ty, values)));
    }

    Ok(Table::try_from_columns(columns)?)
}

/// Write a header row and one record per row; nulls are empty cells
pub fn write_csv<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<(), IngestError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(table.column_names())?;
    let mut record = Vec::with_capacity(table.num_columns());
    for row in 0..table.num_rows() {
        record.clear();
        record.extend((0..table.num_columns()).map(|col| table.value(row, col).to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
