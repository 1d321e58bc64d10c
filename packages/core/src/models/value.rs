//! Single cell values
//!
//! `Scalar` is the row-at-a-time view of a columnar cell. It is what the filter
//! evaluator, group/join keys, sorting and the row-oriented view work with.

use crate::models::ColumnType;
use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type, TimestampMicrosecondType};
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Format used when writing timestamps as text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Text formats accepted when reading timestamps (besides RFC 3339)
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Microseconds since the Unix epoch (UTC, no zone)
    Timestamp(i64),
}

impl Scalar {
    /// Read the value at `row` from a column of the given type.
    ///
    /// Panics if `array` does not hold `ty`; tables validate their schema at
    /// construction so a mismatch is a broken invariant.
    pub fn from_array(array: &dyn Array, ty: ColumnType, row: usize) -> Self {
        if array.is_null(row) {
            return Scalar::Null;
        }
        match ty {
            ColumnType::Int64 => Scalar::Int(array.as_primitive::<Int64Type>().value(row)),
            ColumnType::Float64 => Scalar::Float(array.as_primitive::<Float64Type>().value(row)),
            ColumnType::Utf8 => Scalar::Text(array.as_string::<i32>().value(row).to_string()),
            ColumnType::Boolean => Scalar::Bool(array.as_boolean().value(row)),
            ColumnType::Timestamp => {
                Scalar::Timestamp(array.as_primitive::<TimestampMicrosecondType>().value(row))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Element type of this value, `None` for null
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Scalar::Null => None,
            Scalar::Int(_) => Some(ColumnType::Int64),
            Scalar::Float(_) => Some(ColumnType::Float64),
            Scalar::Text(_) => Some(ColumnType::Utf8),
            Scalar::Bool(_) => Some(ColumnType::Boolean),
            Scalar::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Numeric view of int and float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare two values of compatible kinds.
    ///
    /// Returns `None` when either side is null, when the kinds differ (ints and
    /// floats compare numerically), or when a float is NaN.
    pub fn partial_compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Total ordering used for sort and group keys: nulls sort last, ints and
    /// floats compare numerically, remaining cross-kind pairs order by kind.
    pub fn total_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Null, _) => Ordering::Greater,
            (_, Scalar::Null) => Ordering::Less,
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.kind_rank().cmp(&b.kind_rank()),
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::Timestamp(_) => 2,
            Scalar::Text(_) => 3,
            Scalar::Null => 4,
        }
    }

    /// JSON representation used by the row-oriented view and tool results.
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Int(v) => Value::from(*v),
            Scalar::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Text(v) => Value::String(v.clone()),
            Scalar::Bool(v) => Value::Bool(*v),
            Scalar::Timestamp(v) => format_timestamp(*v)
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part ("1.0"), so text output re-reads as float
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Text(v) => f.write_str(v),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Timestamp(v) => match format_timestamp(*v) {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}", v),
            },
        }
    }
}

/// Render epoch microseconds as `YYYY-MM-DDTHH:MM:SS[.ffffff]`
pub fn format_timestamp(micros: i64) -> Option<String> {
    DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc().format(TIMESTAMP_FORMAT).to_string())
}

/// Parse a date or date-time string into epoch microseconds.
///
/// Accepts RFC 3339 (converted to UTC), naive date-times with `T` or space
/// separators, and plain `YYYY-MM-DD` dates (midnight).
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_micros());
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ndt.and_utc().timestamp_micros());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().timestamp_micros())
}

/// Build a column of `ty` from scalars.
///
/// Int values are accepted by float columns. Any other kind mismatch is a
/// broken invariant and panics.
pub fn build_array<I>(ty: ColumnType, values: I) -> ArrayRef
where
    I: IntoIterator<Item = Scalar>,
{
    let values = values.into_iter();
    match ty {
        ColumnType::Int64 => Arc::new(
            values
                .map(|v| match v {
                    Scalar::Int(x) => Some(x),
                    Scalar::Null => None,
                    other => mismatch(ty, &other),
                })
                .collect::<Int64Array>(),
        ),
        ColumnType::Float64 => Arc::new(
            values
                .map(|v| match v {
                    Scalar::Float(x) => Some(x),
                    Scalar::Int(x) => Some(x as f64),
                    Scalar::Null => None,
                    other => mismatch(ty, &other),
                })
                .collect::<Float64Array>(),
        ),
        ColumnType::Utf8 => Arc::new(
            values
                .map(|v| match v {
                    Scalar::Text(x) => Some(x),
                    Scalar::Null => None,
                    other => mismatch(ty, &other),
                })
                .collect::<StringArray>(),
        ),
        ColumnType::Boolean => Arc::new(
            values
                .map(|v| match v {
                    Scalar::Bool(x) => Some(x),
                    Scalar::Null => None,
                    other => mismatch(ty, &other),
                })
                .collect::<BooleanArray>(),
        ),
        ColumnType::Timestamp => Arc::new(
            values
                .map(|v| match v {
                    Scalar::Timestamp(x) => Some(x),
                    Scalar::Null => None,
                    other => mismatch(ty, &other),
                })
                .collect::<TimestampMicrosecondArray>(),
        ),
    }
}

fn mismatch<T>(ty: ColumnType, value: &Scalar) -> T {
    panic!("scalar {:?} cannot be stored in a {} column", value, ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_compare_mixes_int_and_float() {
        assert_eq!(
            Scalar::Int(3).partial_compare(&Scalar::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Scalar::Null.partial_compare(&Scalar::Int(1)), None);
        assert_eq!(
            Scalar::Text("a".into()).partial_compare(&Scalar::Int(1)),
            None
        );
    }

    #[test]
    fn test_total_cmp_sorts_nulls_last() {
        let mut values = vec![Scalar::Null, Scalar::Int(2), Scalar::Float(1.5)];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values, vec![Scalar::Float(1.5), Scalar::Int(2), Scalar::Null]);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let micros = parse_timestamp("2024-03-01 12:30:00").unwrap();
        assert_eq!(format_timestamp(micros).unwrap(), "2024-03-01T12:30:00");

        let with_fraction = parse_timestamp("2024-03-01T12:30:00.250").unwrap();
        assert_eq!(with_fraction - micros, 250_000);

        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            parse_timestamp("2024-03-01T00:00:00").unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-03-01T14:30:00+02:00").unwrap(),
            micros
        );
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_non_finite_float_serializes_as_null() {
        assert_eq!(Scalar::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(Scalar::Float(1.5).to_json(), serde_json::json!(1.5));
    }

    #[test]
    fn test_float_display_keeps_fraction() {
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
        assert_eq!(Scalar::Null.to_string(), "");
    }

    #[test]
    fn test_build_array_promotes_ints_in_float_columns() {
        let array = build_array(
            ColumnType::Float64,
            vec![Scalar::Int(1), Scalar::Null, Scalar::Float(2.5)],
        );
        assert_eq!(array.len(), 3);
        assert!(array.is_null(1));
        assert_eq!(
            Scalar::from_array(array.as_ref(), ColumnType::Float64, 0),
            Scalar::Float(1.0)
        );
    }
}
