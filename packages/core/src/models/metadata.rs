//! Table metadata computed at store time

use crate::models::{ColumnType, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Name and element type of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: ColumnType,
}

/// Attributes of a table that are cheap to read but costly to recompute.
///
/// Computed from the table before it enters the registry (see
/// [`TableProfile`]) and completed with the handle and insertion sequence
/// under the registry lock. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub handle: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub memory_bytes: u64,
    #[serde(default)]
    pub source: Option<String>,
    /// Insertion order within the registry lifetime
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl TableMetadata {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / BYTES_PER_MEGABYTE
    }
}

/// Handle-independent part of the metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TableProfile {
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub memory_bytes: u64,
}

impl TableProfile {
    pub fn of(table: &Table) -> Self {
        let columns = table
            .column_names()
            .into_iter()
            .zip(table.column_types())
            .map(|(name, dtype)| ColumnInfo {
                name,
                dtype: *dtype,
            })
            .collect();
        Self {
            row_count: table.num_rows(),
            columns,
            memory_bytes: table.estimated_memory_bytes(),
        }
    }

    pub fn into_metadata(
        self,
        handle: String,
        sequence: u64,
        source: Option<String>,
    ) -> TableMetadata {
        TableMetadata {
            handle,
            row_count: self.row_count,
            column_count: self.columns.len(),
            columns: self.columns,
            memory_bytes: self.memory_bytes,
            source,
            sequence,
            created_at: Utc::now(),
        }
    }
}

/// Convert a byte count to megabytes
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_profile_matches_table() {
        let table = Table::try_from_columns(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("tag", Arc::new(StringArray::from(vec!["x", "yz"])) as ArrayRef),
        ])
        .unwrap();

        let metadata = TableProfile::of(&table).into_metadata("t1".into(), 7, Some("test".into()));

        assert_eq!(metadata.handle, "t1");
        assert_eq!(metadata.row_count, 2);
        assert_eq!(metadata.column_count, 2);
        assert_eq!(metadata.column_names(), vec!["id", "tag"]);
        assert_eq!(metadata.columns[1].dtype, ColumnType::Utf8);
        assert_eq!(metadata.memory_bytes, table.estimated_memory_bytes());
        assert_eq!(metadata.sequence, 7);
        assert_eq!(metadata.source.as_deref(), Some("test"));
    }

    #[test]
    fn test_megabyte_conversion() {
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(0), 0.0);
    }
}
