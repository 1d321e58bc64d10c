//! Group-by aggregation
//!
//! Rows are bucketed by the values of the group columns; rows with a null (or
//! NaN) group value are dropped. Groups are emitted in ascending key order.
//! Each aggregation skips nulls in its input column.

use crate::models::{ColumnType, Scalar, Table};
use crate::operations::key::KeyPart;
use crate::operations::{resolve_column, resolve_columns, OperationError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunction {
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Median,
    Std,
    First,
    Last,
    Nunique,
}

impl AggFunction {
    pub const ALL: [AggFunction; 10] = [
        AggFunction::Sum,
        AggFunction::Mean,
        AggFunction::Count,
        AggFunction::Min,
        AggFunction::Max,
        AggFunction::Median,
        AggFunction::Std,
        AggFunction::First,
        AggFunction::Last,
        AggFunction::Nunique,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggFunction::Sum => "sum",
            AggFunction::Mean => "mean",
            AggFunction::Count => "count",
            AggFunction::Min => "min",
            AggFunction::Max => "max",
            AggFunction::Median => "median",
            AggFunction::Std => "std",
            AggFunction::First => "first",
            AggFunction::Last => "last",
            AggFunction::Nunique => "nunique",
        }
    }

    fn requires_numeric(&self) -> bool {
        matches!(
            self,
            AggFunction::Sum | AggFunction::Mean | AggFunction::Median | AggFunction::Std
        )
    }

    /// Output column type for an input column type
    fn output_type(&self, input: ColumnType) -> ColumnType {
        match self {
            AggFunction::Count | AggFunction::Nunique => ColumnType::Int64,
            AggFunction::Mean | AggFunction::Median | AggFunction::Std => ColumnType::Float64,
            AggFunction::Sum | AggFunction::Min | AggFunction::Max => input,
            AggFunction::First | AggFunction::Last => input,
        }
    }
}

impl fmt::Display for AggFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(AggFunction::Sum),
            "mean" | "avg" | "average" => Ok(AggFunction::Mean),
            "count" | "size" => Ok(AggFunction::Count),
            "min" => Ok(AggFunction::Min),
            "max" => Ok(AggFunction::Max),
            "median" => Ok(AggFunction::Median),
            "std" | "stddev" => Ok(AggFunction::Std),
            "first" => Ok(AggFunction::First),
            "last" => Ok(AggFunction::Last),
            "nunique" | "count_distinct" => Ok(AggFunction::Nunique),
            other => Err(format!(
                "Unknown aggregation function '{}'. Supported: {}",
                other,
                AggFunction::ALL.map(|f| f.name()).join(", ")
            )),
        }
    }
}

/// Functions to apply to one source column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub column: String,
    pub functions: Vec<AggFunction>,
}

impl Aggregation {
    pub fn new(column: impl Into<String>, functions: Vec<AggFunction>) -> Self {
        Self {
            column: column.into(),
            functions,
        }
    }

    pub fn single(column: impl Into<String>, function: AggFunction) -> Self {
        Self::new(column, vec![function])
    }
}

struct OutputColumn {
    name: String,
    source: usize,
    function: AggFunction,
    ty: ColumnType,
}

/// Group `table` by `by` and apply `aggregations`.
///
/// The result has the group columns first, then one column per (column,
/// function) pair. A column aggregated with a single function keeps its name;
/// with several functions, or when the name collides with a group column, the
/// output is named `{column}_{function}`.
pub fn group_by(
    table: &Table,
    by: &[String],
    aggregations: &[Aggregation],
) -> Result<Table, OperationError> {
    if by.is_empty() {
        return Err(OperationError::invalid_argument(
            "group_by needs at least one group column",
        ));
    }
    let key_indices = resolve_columns(table, by)?;
    let outputs = plan_outputs(table, by, aggregations)?;

    // Bucket rows by key, remembering first-seen order of row indices
    let mut lookup: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Scalar>, Vec<usize>)> = Vec::new();
    'rows: for row in 0..table.num_rows() {
        let mut key = Vec::with_capacity(key_indices.len());
        let mut values = Vec::with_capacity(key_indices.len());
        for &col in &key_indices {
            let value = table.value(row, col);
            let Some(part) = KeyPart::from_scalar(&value) else {
                continue 'rows;
            };
            key.push(part);
            values.push(value);
        }
        match lookup.get(&key) {
            Some(&group) => groups[group].1.push(row),
            None => {
                lookup.insert(key, groups.len());
                groups.push((values, vec![row]));
            }
        }
    }

    groups.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(
        "Grouped {} rows into {} groups by {:?}",
        table.num_rows(),
        groups.len(),
        by
    );

    let mut columns = Vec::with_capacity(key_indices.len() + outputs.len());
    for (position, &col) in key_indices.iter().enumerate() {
        let values: Vec<Scalar> = groups.iter().map(|(key, _)| key[position].clone()).collect();
        columns.push((by[position].clone(), table.column_type(col), values));
    }
    for output in outputs {
        let values: Vec<Scalar> = groups
            .iter()
            .map(|(_, rows)| {
                let inputs: Vec<Scalar> = rows
                    .iter()
                    .map(|&row| table.value(row, output.source))
                    .filter(|value| !value.is_null())
                    .collect();
                aggregate(output.function, output.ty, inputs)
            })
            .collect();
        columns.push((output.name, output.ty, values));
    }

    Ok(Table::from_scalars(columns)?)
}

fn plan_outputs(
    table: &Table,
    by: &[String],
    aggregations: &[Aggregation],
) -> Result<Vec<OutputColumn>, OperationError> {
    let mut outputs = Vec::new();
    for aggregation in aggregations {
        let source = resolve_column(table, &aggregation.column)?;
        if aggregation.functions.is_empty() {
            return Err(OperationError::invalid_argument(format!(
                "no aggregation function given for column '{}'",
                aggregation.column
            )));
        }
        let input = table.column_type(source);
        let rename = aggregation.functions.len() > 1 || by.contains(&aggregation.column);

        for &function in &aggregation.functions {
            if function.requires_numeric() && !input.is_numeric() {
                return Err(OperationError::invalid_aggregation(
                    &aggregation.column,
                    function.name(),
                    format!("column type is {}, a numeric column is required", input),
                ));
            }
            let name = if rename {
                format!("{}_{}", aggregation.column, function)
            } else {
                aggregation.column.clone()
            };
            outputs.push(OutputColumn {
                name,
                source,
                function,
                ty: function.output_type(input),
            });
        }
    }

    let mut seen: HashSet<&str> = by.iter().map(String::as_str).collect();
    for output in &outputs {
        if !seen.insert(output.name.as_str()) {
            return Err(OperationError::duplicate_output(&output.name, "group_by"));
        }
    }
    Ok(outputs)
}

/// Aggregate the non-null values of one group
fn aggregate(function: AggFunction, output: ColumnType, values: Vec<Scalar>) -> Scalar {
    match function {
        AggFunction::Count => Scalar::Int(values.len() as i64),
        AggFunction::Nunique => {
            let distinct: HashSet<KeyPart> = values.iter().filter_map(KeyPart::from_scalar).collect();
            Scalar::Int(distinct.len() as i64)
        }
        AggFunction::First => values.into_iter().next().unwrap_or(Scalar::Null),
        AggFunction::Last => values.into_iter().last().unwrap_or(Scalar::Null),
        AggFunction::Min => values
            .into_iter()
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(Scalar::Null),
        AggFunction::Max => values
            .into_iter()
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or(Scalar::Null),
        AggFunction::Sum if output == ColumnType::Int64 => values
            .iter()
            .try_fold(0i64, |acc, value| match value {
                Scalar::Int(v) => acc.checked_add(*v),
                _ => Some(acc),
            })
            .map(Scalar::Int)
            .unwrap_or(Scalar::Null),
        AggFunction::Sum => Scalar::Float(numbers(&values).sum()),
        AggFunction::Mean => {
            let numbers: Vec<f64> = numbers(&values).collect();
            if numbers.is_empty() {
                Scalar::Null
            } else {
                Scalar::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
        }
        AggFunction::Median => {
            let mut numbers: Vec<f64> = numbers(&values).collect();
            numbers.sort_by(f64::total_cmp);
            quantile(&numbers, 0.5).map(Scalar::Float).unwrap_or(Scalar::Null)
        }
        AggFunction::Std => {
            let numbers: Vec<f64> = numbers(&values).collect();
            sample_std(&numbers).map(Scalar::Float).unwrap_or(Scalar::Null)
        }
    }
}

fn numbers(values: &[Scalar]) -> impl Iterator<Item = f64> + '_ {
    values
        .iter()
        .filter_map(Scalar::as_f64)
        .filter(|v| !v.is_nan())
}

/// Linear-interpolated quantile of sorted values
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Sample standard deviation (n - 1 denominator); needs two values
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

// Include tests
#[cfg(test)]
#[path = "aggregate_test.rs"]
mod aggregate_test;
