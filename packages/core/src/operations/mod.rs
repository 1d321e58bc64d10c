//! Relational Operations
//!
//! Pure functions that derive a new [`Table`] from one or two existing tables.
//! Inputs are never mutated; the service layer decides where results are
//! stored.
//!
//! - [`filter`] rows matching a boolean expression
//! - [`select`] a subset of columns in a given order
//! - [`group_by`] with per-column aggregation functions
//! - [`join`] two tables on shared key columns
//! - [`sort`], [`head`], [`tail`] and [`describe`] for inspection

pub mod aggregate;
pub mod describe;
mod error;
pub mod filter;
pub mod join;
mod key;
pub mod select;
pub mod sort;

pub use aggregate::{group_by, AggFunction, Aggregation};
pub use describe::{describe, DESCRIBE_STATISTICS};
pub use error::OperationError;
pub use filter::filter;
pub use join::{join, JoinType};
pub use select::select;
pub use sort::{head, sort, tail, SortKey};

use crate::models::Table;

/// Index of a named column, or `UnknownColumn` listing the valid names
pub(crate) fn resolve_column(table: &Table, name: &str) -> Result<usize, OperationError> {
    table
        .column_index(name)
        .ok_or_else(|| OperationError::unknown_column(name, table.column_names()))
}

/// Indices of several named columns, rejecting duplicates
pub(crate) fn resolve_columns(table: &Table, names: &[String]) -> Result<Vec<usize>, OperationError> {
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let index = resolve_column(table, name)?;
        if indices.contains(&index) {
            return Err(OperationError::invalid_argument(format!(
                "column '{}' is listed more than once",
                name
            )));
        }
        indices.push(index);
    }
    Ok(indices)
}
