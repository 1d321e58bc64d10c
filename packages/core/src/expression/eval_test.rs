//! Tests for expression binding and evaluation

use super::*;
use crate::models::{ColumnType, Scalar, Table};

fn sample() -> Table {
    Table::from_scalars(vec![
        (
            "id".to_string(),
            ColumnType::Int64,
            (1..=5).map(Scalar::Int).collect(),
        ),
        (
            "value".to_string(),
            ColumnType::Float64,
            vec![
                Scalar::Float(10.0),
                Scalar::Float(20.0),
                Scalar::Float(30.0),
                Scalar::Null,
                Scalar::Float(50.0),
            ],
        ),
        (
            "city".to_string(),
            ColumnType::Utf8,
            ["Oslo", "Bergen", "Oslo", "Tromsø", "Bergen"]
                .iter()
                .map(|s| Scalar::Text(s.to_string()))
                .collect(),
        ),
        (
            "active".to_string(),
            ColumnType::Boolean,
            vec![
                Scalar::Bool(true),
                Scalar::Bool(false),
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Bool(false),
            ],
        ),
        (
            "seen".to_string(),
            ColumnType::Timestamp,
            ["2024-01-01", "2024-02-01", "2024-03-01", "2024-04-01", "2024-05-01"]
                .iter()
                .map(|s| Scalar::Timestamp(parse_timestamp(s).unwrap()))
                .collect(),
        ),
    ])
    .unwrap()
}

fn mask(expression: &str) -> Vec<bool> {
    let table = sample();
    let predicate = Predicate::compile(expression, &table).unwrap();
    predicate.evaluate(&table).iter().map(|v| v.unwrap()).collect()
}

fn compile_err(expression: &str) -> ExpressionError {
    Predicate::compile(expression, &sample()).unwrap_err()
}

#[test]
fn test_numeric_comparison() {
    assert_eq!(mask("id > 2"), vec![false, false, true, true, true]);
    assert_eq!(mask("id <= 2.5"), vec![true, true, false, false, false]);
}

#[test]
fn test_null_comparisons_are_false() {
    assert_eq!(mask("value > 15"), vec![false, true, true, false, true]);
    assert_eq!(mask("value != 20"), vec![true, false, true, false, true]);
    assert_eq!(mask("value == None"), vec![false; 5]);
    // Negating a false comparison selects the null row
    assert_eq!(mask("not value > 15"), vec![true, false, false, true, false]);
}

#[test]
fn test_boolean_column_and_logic() {
    assert_eq!(mask("active"), vec![true, false, false, true, false]);
    assert_eq!(mask("~active"), vec![false, true, true, false, true]);
    assert_eq!(
        mask("active and id > 1 or city == 'Bergen'"),
        vec![false, true, false, true, true]
    );
    assert_eq!(
        mask("(id == 1) | (id == 5)"),
        vec![true, false, false, false, true]
    );
}

#[test]
fn test_in_list() {
    assert_eq!(
        mask("city in ['Oslo', 'Tromsø']"),
        vec![true, false, true, true, false]
    );
    assert_eq!(mask("id not in [1, 2]"), vec![false, false, true, true, true]);
    // Null never matches, negated or not
    assert_eq!(mask("value not in [10]"), vec![false, true, true, false, true]);
}

#[test]
fn test_arithmetic() {
    assert_eq!(mask("id % 2 == 0"), vec![false, true, false, true, false]);
    assert_eq!(mask("value / 10 == id"), vec![true, true, true, false, true]);
    assert_eq!(mask("id * 10 - 5 > 20"), vec![false, false, true, true, true]);
    assert_eq!(mask("-id < -3"), vec![false, false, false, true, true]);
}

#[test]
fn test_modulo_takes_sign_of_divisor() {
    assert_eq!(mask("id % -2 == -1"), vec![true, false, true, false, true]);
    assert_eq!(mask("(0 - id) % 3 == 2"), vec![true, false, false, true, false]);

    assert_eq!(floor_mod_int(7, -2), Some(-1));
    assert_eq!(floor_mod_int(-7, 2), Some(1));
    assert_eq!(floor_mod_int(-6, 3), Some(0));
    assert_eq!(floor_mod_int(i64::MIN, -1), None);
    assert_eq!(floor_mod(7.5, -2.0), -0.5);
    assert_eq!(floor_mod(-7.5, 2.0), 0.5);
}

#[test]
fn test_division_by_zero_is_null() {
    assert_eq!(mask("id / 0 > 0"), vec![false; 5]);
    assert_eq!(mask("id % 0 == 0"), vec![false; 5]);
}

#[test]
fn test_integer_overflow_is_null() {
    assert_eq!(mask("id * 9223372036854775807 > 0"), vec![true, false, false, false, false]);
}

#[test]
fn test_timestamp_literals() {
    assert_eq!(
        mask("seen >= '2024-03-01'"),
        vec![false, false, true, true, true]
    );
    assert_eq!(
        mask("'2024-02-15T00:00:00' > seen"),
        vec![true, true, false, false, false]
    );
    assert!(matches!(
        compile_err("seen > 'yesterday'"),
        ExpressionError::TypeMismatch(_)
    ));
}

#[test]
fn test_unknown_column_suggests_closest() {
    let err = compile_err("vale > 1");
    let ExpressionError::UnknownColumn {
        column,
        available,
        suggestion,
    } = &err
    else {
        panic!("expected unknown column, got {:?}", err)
    };
    assert_eq!(column, "vale");
    assert_eq!(available, &vec!["id", "value", "city", "active", "seen"]);
    assert_eq!(suggestion.as_deref(), Some("value"));
    assert_eq!(err.suggestion().as_deref(), Some("Did you mean 'value'?"));
}

#[test]
fn test_type_errors() {
    assert!(matches!(
        compile_err("city > 3"),
        ExpressionError::TypeMismatch(_)
    ));
    assert!(matches!(
        compile_err("city + 1 == 2"),
        ExpressionError::TypeMismatch(_)
    ));
    assert!(matches!(
        compile_err("id and active"),
        ExpressionError::TypeMismatch(_)
    ));
    assert!(matches!(
        compile_err("id in ['a']"),
        ExpressionError::TypeMismatch(_)
    ));
}

#[test]
fn test_result_must_be_boolean() {
    assert_eq!(
        compile_err("value + 1"),
        ExpressionError::NotBoolean("float64".to_string())
    );
    assert_eq!(
        compile_err("city"),
        ExpressionError::NotBoolean("utf8".to_string())
    );
}

#[test]
fn test_referenced_columns() {
    let table = sample();
    let predicate = Predicate::compile("value > id and id < 4 or city == 'Oslo'", &table).unwrap();
    assert_eq!(predicate.referenced_columns(), ["value", "id", "city"]);
}

#[test]
fn test_empty_table_evaluates_to_empty_mask() {
    let table = sample().batch().slice(0, 0);
    let table = Table::from_batch(table).unwrap();
    let predicate = Predicate::compile("id > 1", &table).unwrap();
    assert_eq!(predicate.evaluate(&table).len(), 0);
}
