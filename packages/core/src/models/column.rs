//! Column element types
//!
//! Every stored column carries exactly one of these element types. The mapping
//! onto Arrow data types is fixed, so a table's schema fully determines how each
//! column is read, compared and exported.

use arrow_schema::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported column element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int64,
    Float64,
    Utf8,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// Arrow data type used for storage
    pub fn to_arrow(self) -> DataType {
        match self {
            ColumnType::Int64 => DataType::Int64,
            ColumnType::Float64 => DataType::Float64,
            ColumnType::Utf8 => DataType::Utf8,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }

    /// Resolve an Arrow data type, returning `None` for anything outside the
    /// supported set (use ingest normalization to widen foreign types first)
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int64 => Some(ColumnType::Int64),
            DataType::Float64 => Some(ColumnType::Float64),
            DataType::Utf8 => Some(ColumnType::Utf8),
            DataType::Boolean => Some(ColumnType::Boolean),
            DataType::Timestamp(TimeUnit::Microsecond, None) => Some(ColumnType::Timestamp),
            _ => None,
        }
    }

    /// Type name reported in metadata and error messages
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Utf8 => "utf8",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }

    /// Approximate per-row footprint in bytes.
    ///
    /// For `Utf8` this is the offset width only; the encoded string bytes are
    /// added separately by the memory estimator.
    pub fn element_width(self) -> usize {
        match self {
            ColumnType::Int64 | ColumnType::Float64 | ColumnType::Timestamp => 8,
            ColumnType::Utf8 => 4,
            ColumnType::Boolean => 1,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
