//! Immutable columnar table
//!
//! A `Table` wraps an Arrow `RecordBatch`. Construction validates the invariants
//! every other layer relies on:
//!
//! - at least one column, unique column names
//! - all columns have the same length
//! - every column uses a supported [`ColumnType`]
//!
//! The schema is normalized (nullable fields, no metadata) so two tables are
//! equal exactly when their names, order, types and values are equal. Cloning
//! a table only bumps `Arc` reference counts; the buffers are never mutated.

use crate::models::{build_array, ColumnType, Scalar};
use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{ArrowError, Field, Schema, SchemaRef};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Reasons a set of columns cannot form a table
#[derive(Error, Debug)]
pub enum TableError {
    #[error("A table needs at least one column")]
    NoColumns,

    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
    types: Arc<[ColumnType]>,
}

impl Table {
    /// Build a table from named Arrow arrays
    pub fn try_from_columns<S>(columns: Vec<(S, ArrayRef)>) -> Result<Self, TableError>
    where
        S: Into<String>,
    {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }

        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for (name, array) in columns {
            fields.push(Field::new(name.into(), array.data_type().clone(), true));
            arrays.push(array);
        }

        let expected = arrays[0].len();
        for (field, array) in fields.iter().zip(&arrays) {
            if array.len() != expected {
                return Err(TableError::LengthMismatch {
                    column: field.name().clone(),
                    expected,
                    actual: array.len(),
                });
            }
        }

        Self::validated(Arc::new(Schema::new(fields)), arrays)
    }

    /// Wrap an existing record batch, normalizing its schema
    pub fn from_batch(batch: RecordBatch) -> Result<Self, TableError> {
        let fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| Field::new(f.name().clone(), f.data_type().clone(), true))
            .collect();
        if fields.is_empty() {
            return Err(TableError::NoColumns);
        }
        Self::validated(Arc::new(Schema::new(fields)), batch.columns().to_vec())
    }

    /// Build a table from typed scalar columns
    pub fn from_scalars(columns: Vec<(String, ColumnType, Vec<Scalar>)>) -> Result<Self, TableError> {
        let columns = columns
            .into_iter()
            .map(|(name, ty, values)| (name, build_array(ty, values)))
            .collect();
        Self::try_from_columns(columns)
    }

    fn validated(schema: SchemaRef, arrays: Vec<ArrayRef>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let mut types = Vec::with_capacity(arrays.len());
        for field in schema.fields() {
            if !seen.insert(field.name().clone()) {
                return Err(TableError::DuplicateColumn(field.name().clone()));
            }
            let ty = ColumnType::from_arrow(field.data_type()).ok_or_else(|| {
                TableError::UnsupportedType {
                    column: field.name().clone(),
                    data_type: field.data_type().to_string(),
                }
            })?;
            types.push(ty);
        }

        let batch = RecordBatch::try_new(schema, arrays)?;
        Ok(Self {
            batch,
            types: types.into(),
        })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Underlying record batch (shared, read-only)
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.batch.schema().index_of(name).ok()
    }

    pub fn column(&self, index: usize) -> &ArrayRef {
        self.batch.column(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn column_type(&self, index: usize) -> ColumnType {
        self.types[index]
    }

    /// Value at (`row`, `column`)
    pub fn value(&self, row: usize, column: usize) -> Scalar {
        Scalar::from_array(self.column(column).as_ref(), self.types[column], row)
    }

    /// Estimated resident size: element width × rows per column, plus the
    /// encoded byte length of every text value.
    pub fn estimated_memory_bytes(&self) -> u64 {
        let rows = self.num_rows() as u64;
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                let fixed = ty.element_width() as u64 * rows;
                match ty {
                    ColumnType::Utf8 => fixed + text_bytes(self.column(index).as_ref()),
                    _ => fixed,
                }
            })
            .sum()
    }

    /// Zero-copy row range, clamped to the table
    pub fn slice(&self, offset: usize, length: usize) -> Table {
        let start = offset.min(self.num_rows());
        let length = length.min(self.num_rows() - start);
        Self {
            batch: self.batch.slice(start, length),
            types: self.types.clone(),
        }
    }

    /// Rows `offset..offset + limit` as a row-oriented view
    pub fn slice_rows(&self, offset: usize, limit: Option<usize>) -> RowOrientedView {
        let start = offset.min(self.num_rows());
        let end = match limit {
            Some(limit) => start.saturating_add(limit).min(self.num_rows()),
            None => self.num_rows(),
        };
        let rows = (start..end)
            .map(|row| (0..self.num_columns()).map(|col| self.value(row, col)).collect())
            .collect();
        RowOrientedView {
            columns: self.column_names(),
            rows,
        }
    }

    /// Full row-oriented materialization
    pub fn to_rows(&self) -> RowOrientedView {
        self.slice_rows(0, None)
    }
}

fn text_bytes(array: &dyn Array) -> u64 {
    let strings = array.as_string::<i32>();
    let offsets = strings.value_offsets();
    match (offsets.first(), offsets.last()) {
        (Some(first), Some(last)) => (*last - *first) as u64,
        _ => 0,
    }
}

/// Row-oriented (record) view of a table.
///
/// Serializes as an array of JSON objects whose keys follow column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOrientedView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl RowOrientedView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in `row`
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }

    fn record(&self, row: &[Scalar]) -> Map<String, Value> {
        self.columns
            .iter()
            .zip(row)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

impl Serialize for RowOrientedView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&self.record(row))?;
        }
        seq.end()
    }
}

// Include tests
#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
