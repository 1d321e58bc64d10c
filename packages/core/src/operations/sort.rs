//! Sorting and row windows

use crate::models::{Scalar, Table};
use crate::operations::{resolve_column, OperationError};
use arrow_array::UInt64Array;
use arrow_select::take::take_record_batch;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Stable sort by one or more columns; nulls sort last in either direction
pub fn sort(table: &Table, keys: &[SortKey]) -> Result<Table, OperationError> {
    if keys.is_empty() {
        return Err(OperationError::invalid_argument(
            "sort needs at least one column",
        ));
    }

    let mut columns: Vec<(Vec<Scalar>, bool)> = Vec::with_capacity(keys.len());
    for key in keys {
        let index = resolve_column(table, &key.column)?;
        let values = (0..table.num_rows())
            .map(|row| table.value(row, index))
            .collect();
        columns.push((values, key.ascending));
    }

    let mut order: Vec<usize> = (0..table.num_rows()).collect();
    order.sort_by(|&a, &b| {
        for (values, ascending) in &columns {
            let ordering = compare_nulls_last(&values[a], &values[b], *ascending);
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    });

    let indices: UInt64Array = order.into_iter().map(|row| row as u64).collect();
    let batch = take_record_batch(table.batch(), &indices)?;
    Ok(Table::from_batch(batch)?)
}

fn compare_nulls_last(a: &Scalar, b: &Scalar, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if ascending => a.total_cmp(b),
        (false, false) => b.total_cmp(a),
    }
}

/// First `n` rows
pub fn head(table: &Table, n: usize) -> Table {
    table.slice(0, n)
}

/// Last `n` rows
pub fn tail(table: &Table, n: usize) -> Table {
    let start = table.num_rows().saturating_sub(n);
    table.slice(start, n)
}
