//! Row filtering by boolean expression

use crate::expression::Predicate;
use crate::models::Table;
use crate::operations::OperationError;
use arrow_select::filter::filter_record_batch;
use tracing::debug;

/// Keep the rows of `table` for which `expression` is true.
///
/// An empty result is valid. Unknown columns, syntax errors and type errors
/// are reported as `InvalidExpression`.
pub fn filter(table: &Table, expression: &str) -> Result<Table, OperationError> {
    let predicate = Predicate::compile(expression, table)?;
    let mask = predicate.evaluate(table);
    let batch = filter_record_batch(table.batch(), &mask)?;
    debug!(
        "Filter '{}' kept {} of {} rows",
        expression,
        batch.num_rows(),
        table.num_rows()
    );
    Ok(Table::from_batch(batch)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExpressionError;
    use crate::models::{ColumnType, Scalar};

    fn readings() -> Table {
        Table::from_scalars(vec![
            ("id".into(), ColumnType::Int64, (1..=5).map(Scalar::Int).collect()),
            (
                "name".into(),
                ColumnType::Utf8,
                ["a", "b", "c", "d", "e"]
                    .iter()
                    .map(|s| Scalar::Text(s.to_string()))
                    .collect(),
            ),
            (
                "value".into(),
                ColumnType::Float64,
                [10.5, 20.0, 30.5, 40.0, 50.5]
                    .into_iter()
                    .map(Scalar::Float)
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_filter_keeps_matching_rows() {
        let table = readings();
        let result = filter(&table, "value > 25").unwrap();

        assert_eq!(result.num_rows(), 3);
        assert_eq!(result.column_names(), table.column_names());
        let values: Vec<Scalar> = (0..3).map(|row| result.value(row, 2)).collect();
        assert_eq!(
            values,
            vec![Scalar::Float(30.5), Scalar::Float(40.0), Scalar::Float(50.5)]
        );
        // Source untouched
        assert_eq!(table, readings());
    }

    #[test]
    fn test_filter_may_return_no_rows() {
        let result = filter(&readings(), "value > 1000").unwrap();
        assert_eq!(result.num_rows(), 0);
        assert_eq!(result.num_columns(), 3);
    }

    #[test]
    fn test_filter_unknown_column_is_invalid_expression() {
        let err = filter(&readings(), "price > 3").unwrap_err();
        assert!(matches!(
            err,
            OperationError::InvalidExpression(ExpressionError::UnknownColumn { .. })
        ));
        assert_eq!(err.kind(), "InvalidExpression");
    }

    #[test]
    fn test_filter_syntax_error_is_invalid_expression() {
        let err = filter(&readings(), "value >> 3").unwrap_err();
        assert_eq!(err.kind(), "InvalidExpression");
    }
}
