//! Type inference for text cells
//!
//! A column takes the first type in `boolean → int64 → float64 → timestamp →
//! utf8` that every non-null cell parses as. Columns with no non-null cells
//! are utf8.

use crate::models::{parse_timestamp, ColumnType, Scalar};

/// Cell spellings read as null
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "none", "#N/A",
];

pub fn is_null_token(cell: &str) -> bool {
    NULL_TOKENS.contains(&cell.trim())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidates {
    boolean: bool,
    int: bool,
    float: bool,
    timestamp: bool,
}

impl Candidates {
    fn all() -> Self {
        Self {
            boolean: true,
            int: true,
            float: true,
            timestamp: true,
        }
    }

    fn narrow(&mut self, cell: &str) {
        if self.boolean {
            self.boolean = parse_bool(cell).is_some();
        }
        if self.int {
            self.int = cell.parse::<i64>().is_ok();
        }
        if self.float {
            self.float = cell.parse::<f64>().is_ok();
        }
        if self.timestamp {
            self.timestamp = parse_timestamp(cell).is_some();
        }
    }

    fn any(&self) -> bool {
        self.boolean || self.int || self.float || self.timestamp
    }
}

/// Infer the column type of a sequence of raw cells
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates = Candidates::all();
    let mut saw_value = false;
    for cell in cells {
        if is_null_token(cell) {
            continue;
        }
        saw_value = true;
        candidates.narrow(cell.trim());
        if !candidates.any() {
            return ColumnType::Utf8;
        }
    }

    match (saw_value, candidates) {
        (false, _) => ColumnType::Utf8,
        (_, c) if c.boolean => ColumnType::Boolean,
        (_, c) if c.int => ColumnType::Int64,
        (_, c) if c.float => ColumnType::Float64,
        (_, c) if c.timestamp => ColumnType::Timestamp,
        _ => ColumnType::Utf8,
    }
}

/// Parse one cell as `ty`; cells that do not parse become null
pub fn parse_cell(cell: &str, ty: ColumnType) -> Scalar {
    if is_null_token(cell) {
        return Scalar::Null;
    }
    let trimmed = cell.trim();
    let parsed = match ty {
        ColumnType::Utf8 => Some(Scalar::Text(cell.to_string())),
        ColumnType::Boolean => parse_bool(trimmed).map(Scalar::Bool),
        ColumnType::Int64 => trimmed.parse().ok().map(Scalar::Int),
        ColumnType::Float64 => trimmed.parse().ok().map(Scalar::Float),
        ColumnType::Timestamp => parse_timestamp(trimmed).map(Scalar::Timestamp),
    };
    parsed.unwrap_or(Scalar::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_order() {
        assert_eq!(infer_column_type(["true", "False"]), ColumnType::Boolean);
        assert_eq!(infer_column_type(["1", "-2", ""]), ColumnType::Int64);
        assert_eq!(infer_column_type(["1", "2.5"]), ColumnType::Float64);
        assert_eq!(
            infer_column_type(["2024-01-01", "2024-01-02 10:00:00"]),
            ColumnType::Timestamp
        );
        assert_eq!(infer_column_type(["1", "x"]), ColumnType::Utf8);
        assert_eq!(infer_column_type(["true", "1"]), ColumnType::Utf8);
    }

    #[test]
    fn test_all_null_column_is_text() {
        assert_eq!(infer_column_type(["", "NA", "null"]), ColumnType::Utf8);
        assert_eq!(infer_column_type(Vec::<&str>::new()), ColumnType::Utf8);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(" 42 ", ColumnType::Int64), Scalar::Int(42));
        assert_eq!(parse_cell("NaN", ColumnType::Float64), Scalar::Null);
        assert_eq!(parse_cell("TRUE", ColumnType::Boolean), Scalar::Bool(true));
        assert_eq!(
            parse_cell(" padded ", ColumnType::Utf8),
            Scalar::Text(" padded ".into())
        );
    }
}
