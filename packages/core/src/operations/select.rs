//! Column projection

use crate::models::Table;
use crate::operations::{resolve_columns, OperationError};

/// Project `columns` in the requested order
pub fn select(table: &Table, columns: &[String]) -> Result<Table, OperationError> {
    if columns.is_empty() {
        return Err(OperationError::invalid_argument(
            "select needs at least one column",
        ));
    }
    let indices = resolve_columns(table, columns)?;
    let batch = table.batch().project(&indices)?;
    Ok(Table::from_batch(batch)?)
}
