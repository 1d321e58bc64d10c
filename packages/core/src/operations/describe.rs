//! Summary statistics of numeric columns

use crate::models::{ColumnType, Scalar, Table};
use crate::operations::aggregate::{quantile, sample_std};
use crate::operations::OperationError;

/// Row labels of a `describe` result, in order
pub const DESCRIBE_STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Name of the label column leading a `describe` result
pub const STATISTIC_COLUMN: &str = "statistic";

/// One row per statistic, one float column per numeric source column.
///
/// The first column, `statistic`, holds the row labels. Nulls and NaN are
/// skipped; statistics of an empty column are null except `count`.
pub fn describe(table: &Table) -> Result<Table, OperationError> {
    let numeric: Vec<usize> = (0..table.num_columns())
        .filter(|&i| table.column_type(i).is_numeric())
        .collect();
    if numeric.is_empty() {
        return Err(OperationError::invalid_argument(format!(
            "describe needs at least one numeric column; column types are {}",
            table
                .column_types()
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let names = table.column_names();
    if let Some(&clash) = numeric.iter().find(|&&i| names[i] == STATISTIC_COLUMN) {
        return Err(OperationError::duplicate_output(&names[clash], "describe"));
    }
    let mut columns = vec![(
        STATISTIC_COLUMN.to_string(),
        ColumnType::Utf8,
        DESCRIBE_STATISTICS
            .iter()
            .map(|s| Scalar::Text(s.to_string()))
            .collect(),
    )];
    for index in numeric {
        let mut values: Vec<f64> = (0..table.num_rows())
            .filter_map(|row| table.value(row, index).as_f64())
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(f64::total_cmp);
        columns.push((names[index].clone(), ColumnType::Float64, summarize(&values)));
    }

    Ok(Table::from_scalars(columns)?)
}

fn summarize(sorted: &[f64]) -> Vec<Scalar> {
    let float = |value: Option<f64>| value.map(Scalar::Float).unwrap_or(Scalar::Null);
    let mean = (!sorted.is_empty()).then(|| sorted.iter().sum::<f64>() / sorted.len() as f64);
    vec![
        Scalar::Float(sorted.len() as f64),
        float(mean),
        float(sample_std(sorted)),
        float(sorted.first().copied()),
        float(quantile(sorted, 0.25)),
        float(quantile(sorted, 0.5)),
        float(quantile(sorted, 0.75)),
        float(sorted.last().copied()),
    ]
}
