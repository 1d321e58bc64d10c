//! Hash join of two tables on shared key columns
//!
//! Output layout: key columns once (coalesced from whichever side matched),
//! then the left non-key columns, then the right non-key columns. Non-key
//! names present on both sides get `_x` (left) and `_y` (right) suffixes.

use crate::models::{build_array, ColumnType, Scalar, Table};
use crate::operations::key::KeyPart;
use crate::operations::{resolve_column, OperationError};
use arrow_array::{ArrayRef, UInt64Array};
use arrow_select::take::take;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Outer => "outer",
        })
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "outer" | "full" => Ok(JoinType::Outer),
            other => Err(format!(
                "Unknown join type '{}'. Supported: inner, left, right, outer",
                other
            )),
        }
    }
}

/// Resolved key column pair
struct KeyColumn {
    name: String,
    left: usize,
    right: usize,
    ty: ColumnType,
    /// Int64 joined against Float64; keys are compared as floats
    numeric: bool,
}

impl KeyColumn {
    fn key(&self, value: &Scalar) -> Option<KeyPart> {
        if self.numeric {
            KeyPart::numeric(value)
        } else {
            KeyPart::from_scalar(value)
        }
    }
}

/// Join `left` and `right` on the columns in `on`.
///
/// When `on` is empty the columns common to both tables are used. Key columns
/// must exist on both sides with compatible types; null keys never match.
pub fn join(left: &Table, right: &Table, on: &[String], how: JoinType) -> Result<Table, OperationError> {
    let on = if on.is_empty() {
        common_columns(left, right)?
    } else {
        on.to_vec()
    };
    let keys = resolve_keys(left, right, &on)?;

    let pairs = match how {
        JoinType::Inner | JoinType::Left | JoinType::Outer => {
            let matched = match_rows(left, right, &keys, true, how != JoinType::Inner);
            if how == JoinType::Outer {
                append_unmatched_right(matched, right.num_rows())
            } else {
                matched
            }
        }
        JoinType::Right => match_rows(right, left, &keys, false, true)
            .into_iter()
            .map(|(r, l)| (l, r))
            .collect(),
    };
    debug!(
        "{} join on {:?}: {} x {} rows -> {} rows",
        how,
        on,
        left.num_rows(),
        right.num_rows(),
        pairs.len()
    );

    assemble(left, right, &keys, &pairs)
}

fn common_columns(left: &Table, right: &Table) -> Result<Vec<String>, OperationError> {
    let right_names: HashSet<String> = right.column_names().into_iter().collect();
    let common: Vec<String> = left
        .column_names()
        .into_iter()
        .filter(|name| right_names.contains(name))
        .collect();
    if common.is_empty() {
        return Err(OperationError::invalid_argument(
            "no join columns given and the tables share no column names",
        ));
    }
    Ok(common)
}

fn resolve_keys(left: &Table, right: &Table, on: &[String]) -> Result<Vec<KeyColumn>, OperationError> {
    let mut keys: Vec<KeyColumn> = Vec::with_capacity(on.len());
    for name in on {
        if keys.iter().any(|k| &k.name == name) {
            return Err(OperationError::invalid_argument(format!(
                "join column '{}' is listed more than once",
                name
            )));
        }
        let left_index = resolve_column(left, name).map_err(|_| {
            OperationError::schema_mismatch(
                name,
                format!(
                    "missing from the left table (columns: {})",
                    left.column_names().join(", ")
                ),
            )
        })?;
        let right_index = resolve_column(right, name).map_err(|_| {
            OperationError::schema_mismatch(
                name,
                format!(
                    "missing from the right table (columns: {})",
                    right.column_names().join(", ")
                ),
            )
        })?;

        let left_ty = left.column_type(left_index);
        let right_ty = right.column_type(right_index);
        let (ty, numeric) = if left_ty == right_ty {
            (left_ty, false)
        } else if left_ty.is_numeric() && right_ty.is_numeric() {
            (ColumnType::Float64, true)
        } else {
            return Err(OperationError::schema_mismatch(
                name,
                format!("left key is {}, right key is {}", left_ty, right_ty),
            ));
        };

        keys.push(KeyColumn {
            name: name.clone(),
            left: left_index,
            right: right_index,
            ty,
            numeric,
        });
    }
    Ok(keys)
}

fn row_key(table: &Table, row: usize, keys: &[KeyColumn], left_side: bool) -> Option<Vec<KeyPart>> {
    keys.iter()
        .map(|key| {
            let column = if left_side { key.left } else { key.right };
            key.key(&table.value(row, column))
        })
        .collect()
}

/// Match every row of `outer` against a hash index of `inner`, in `outer` order.
///
/// Returns `(outer_row, inner_row)` pairs; unmatched outer rows are kept with
/// `None` when `keep_unmatched` is set.
fn match_rows(
    outer: &Table,
    inner: &Table,
    keys: &[KeyColumn],
    outer_is_left: bool,
    keep_unmatched: bool,
) -> Vec<(Option<usize>, Option<usize>)> {
    let mut index: HashMap<Vec<KeyPart>, Vec<usize>> = HashMap::new();
    for row in 0..inner.num_rows() {
        if let Some(key) = row_key(inner, row, keys, !outer_is_left) {
            index.entry(key).or_default().push(row);
        }
    }

    let mut pairs = Vec::new();
    for row in 0..outer.num_rows() {
        let matches = row_key(outer, row, keys, outer_is_left).and_then(|key| index.get(&key));
        match matches {
            Some(rows) => pairs.extend(rows.iter().map(|&m| (Some(row), Some(m)))),
            None if keep_unmatched => pairs.push((Some(row), None)),
            None => {}
        }
    }
    pairs
}

fn append_unmatched_right(
    mut pairs: Vec<(Option<usize>, Option<usize>)>,
    right_rows: usize,
) -> Vec<(Option<usize>, Option<usize>)> {
    let mut matched = vec![false; right_rows];
    for (_, right) in &pairs {
        if let Some(row) = right {
            matched[*row] = true;
        }
    }
    pairs.extend(
        matched
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(row, _)| (None, Some(row))),
    );
    pairs
}

fn assemble(
    left: &Table,
    right: &Table,
    keys: &[KeyColumn],
    pairs: &[(Option<usize>, Option<usize>)],
) -> Result<Table, OperationError> {
    let left_indices: UInt64Array = pairs.iter().map(|(l, _)| l.map(|i| i as u64)).collect();
    let right_indices: UInt64Array = pairs.iter().map(|(_, r)| r.map(|i| i as u64)).collect();

    let mut columns: Vec<(String, ArrayRef)> = Vec::new();

    for key in keys {
        let values = pairs.iter().map(|(l, r)| {
            let from_left = l.map(|row| left.value(row, key.left)).unwrap_or(Scalar::Null);
            if from_left.is_null() {
                r.map(|row| right.value(row, key.right)).unwrap_or(Scalar::Null)
            } else {
                from_left
            }
        });
        columns.push((key.name.clone(), build_array(key.ty, values)));
    }

    let left_rest: Vec<usize> = (0..left.num_columns())
        .filter(|i| !keys.iter().any(|k| k.left == *i))
        .collect();
    let right_rest: Vec<usize> = (0..right.num_columns())
        .filter(|i| !keys.iter().any(|k| k.right == *i))
        .collect();
    let left_names = left.column_names();
    let right_names = right.column_names();
    let clashes: HashSet<&String> = left_rest
        .iter()
        .map(|&i| &left_names[i])
        .filter(|name| right_rest.iter().any(|&j| &&right_names[j] == name))
        .collect();

    let suffixed = |name: &String, suffix: &str| {
        if clashes.contains(name) {
            format!("{}_{}", name, suffix)
        } else {
            name.clone()
        }
    };
    let left_out: Vec<(usize, String)> = left_rest
        .iter()
        .map(|&i| (i, suffixed(&left_names[i], "x")))
        .collect();
    let right_out: Vec<(usize, String)> = right_rest
        .iter()
        .map(|&j| (j, suffixed(&right_names[j], "y")))
        .collect();

    // A suffixed name can still land on an existing column
    let mut seen: HashSet<&str> = HashSet::new();
    for name in columns
        .iter()
        .map(|(name, _)| name)
        .chain(left_out.iter().map(|(_, name)| name))
        .chain(right_out.iter().map(|(_, name)| name))
    {
        if !seen.insert(name.as_str()) {
            return Err(OperationError::duplicate_output(name.as_str(), "join"));
        }
    }

    for (i, name) in left_out {
        columns.push((name, take(left.column(i).as_ref(), &left_indices, None)?));
    }
    for (j, name) in right_out {
        columns.push((name, take(right.column(j).as_ref(), &right_indices, None)?));
    }

    Ok(Table::try_from_columns(columns)?)
}

// Include tests
#[cfg(test)]
#[path = "join_test.rs"]
mod join_test;
