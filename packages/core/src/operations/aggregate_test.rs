//! Tests for group-by aggregation

use super::*;

fn text(values: &[Option<&str>]) -> Vec<Scalar> {
    values
        .iter()
        .map(|v| v.map_or(Scalar::Null, |s| Scalar::Text(s.to_string())))
        .collect()
}

fn sales() -> Table {
    Table::from_scalars(vec![
        (
            "region".into(),
            ColumnType::Utf8,
            text(&[Some("west"), Some("east"), Some("west"), None, Some("east"), Some("east")]),
        ),
        (
            "product".into(),
            ColumnType::Utf8,
            text(&[Some("a"), Some("b"), Some("a"), Some("c"), Some("a"), Some("b")]),
        ),
        (
            "amount".into(),
            ColumnType::Int64,
            vec![
                Scalar::Int(10),
                Scalar::Int(20),
                Scalar::Int(30),
                Scalar::Int(40),
                Scalar::Null,
                Scalar::Int(60),
            ],
        ),
        (
            "price".into(),
            ColumnType::Float64,
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0].into_iter().map(Scalar::Float).collect(),
        ),
    ])
    .unwrap()
}

fn by(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn column_values(table: &Table, name: &str) -> Vec<Scalar> {
    let index = table.column_index(name).unwrap();
    (0..table.num_rows()).map(|row| table.value(row, index)).collect()
}

#[test]
fn test_sum_per_group_sorted_and_null_keys_dropped() {
    let result = group_by(
        &sales(),
        &by(&["region"]),
        &[Aggregation::single("amount", AggFunction::Sum)],
    )
    .unwrap();

    assert_eq!(result.column_names(), vec!["region", "amount"]);
    assert_eq!(
        column_values(&result, "region"),
        text(&[Some("east"), Some("west")])
    );
    assert_eq!(
        column_values(&result, "amount"),
        vec![Scalar::Int(80), Scalar::Int(40)]
    );
    assert_eq!(result.column_type(1), ColumnType::Int64);
}

#[test]
fn test_multiple_functions_get_suffixed_names() {
    let result = group_by(
        &sales(),
        &by(&["region"]),
        &[
            Aggregation::new("price", vec![AggFunction::Mean, AggFunction::Max]),
            Aggregation::single("amount", AggFunction::Count),
        ],
    )
    .unwrap();

    assert_eq!(
        result.column_names(),
        vec!["region", "price_mean", "price_max", "amount"]
    );
    assert_eq!(
        column_values(&result, "price_mean"),
        vec![Scalar::Float(13.0 / 3.0), Scalar::Float(2.0)]
    );
    assert_eq!(
        column_values(&result, "price_max"),
        vec![Scalar::Float(6.0), Scalar::Float(3.0)]
    );
    // Count skips the null amount in the east group
    assert_eq!(
        column_values(&result, "amount"),
        vec![Scalar::Int(2), Scalar::Int(2)]
    );
}

#[test]
fn test_aggregating_a_group_column_is_suffixed() {
    let result = group_by(
        &sales(),
        &by(&["product"]),
        &[Aggregation::single("product", AggFunction::Count)],
    )
    .unwrap();
    assert_eq!(result.column_names(), vec!["product", "product_count"]);
    assert_eq!(
        column_values(&result, "product_count"),
        vec![Scalar::Int(3), Scalar::Int(2), Scalar::Int(1)]
    );
}

#[test]
fn test_multi_key_groups() {
    let result = group_by(
        &sales(),
        &by(&["region", "product"]),
        &[Aggregation::single("price", AggFunction::Sum)],
    )
    .unwrap();

    assert_eq!(result.num_rows(), 3);
    assert_eq!(
        column_values(&result, "product"),
        text(&[Some("a"), Some("b"), Some("a")])
    );
    assert_eq!(
        column_values(&result, "price"),
        vec![Scalar::Float(5.0), Scalar::Float(8.0), Scalar::Float(4.0)]
    );
}

#[test]
fn test_first_last_nunique_min() {
    let result = group_by(
        &sales(),
        &by(&["region"]),
        &[
            Aggregation::new(
                "product",
                vec![
                    AggFunction::First,
                    AggFunction::Last,
                    AggFunction::Nunique,
                    AggFunction::Min,
                ],
            ),
        ],
    )
    .unwrap();

    assert_eq!(
        column_values(&result, "product_first"),
        text(&[Some("b"), Some("a")])
    );
    assert_eq!(
        column_values(&result, "product_last"),
        text(&[Some("b"), Some("a")])
    );
    assert_eq!(
        column_values(&result, "product_nunique"),
        vec![Scalar::Int(2), Scalar::Int(1)]
    );
    assert_eq!(
        column_values(&result, "product_min"),
        text(&[Some("a"), Some("a")])
    );
}

#[test]
fn test_median_and_std() {
    let result = group_by(
        &sales(),
        &by(&["region"]),
        &[Aggregation::new(
            "price",
            vec![AggFunction::Median, AggFunction::Std],
        )],
    )
    .unwrap();

    // east prices: 2, 5, 6
    assert_eq!(
        column_values(&result, "price_median"),
        vec![Scalar::Float(5.0), Scalar::Float(2.0)]
    );
    let Scalar::Float(std) = column_values(&result, "price_std")[0] else {
        panic!("expected float std")
    };
    assert!((std - 2.081_665_999_466_133).abs() < 1e-9);
}

#[test]
fn test_sum_of_all_null_group_is_zero_and_mean_is_null() {
    let table = Table::from_scalars(vec![
        ("k".into(), ColumnType::Int64, vec![Scalar::Int(1), Scalar::Int(1)]),
        ("v".into(), ColumnType::Float64, vec![Scalar::Null, Scalar::Null]),
    ])
    .unwrap();
    let result = group_by(
        &table,
        &by(&["k"]),
        &[Aggregation::new("v", vec![AggFunction::Sum, AggFunction::Mean])],
    )
    .unwrap();
    assert_eq!(column_values(&result, "v_sum"), vec![Scalar::Float(0.0)]);
    assert_eq!(column_values(&result, "v_mean"), vec![Scalar::Null]);
}

#[test]
fn test_empty_table_gives_empty_result_with_columns() {
    let empty = Table::from_batch(sales().batch().slice(0, 0)).unwrap();
    let result = group_by(
        &empty,
        &by(&["region"]),
        &[
            Aggregation::single("amount", AggFunction::Sum),
            Aggregation::single("price", AggFunction::Mean),
        ],
    )
    .unwrap();

    assert_eq!(result.num_rows(), 0);
    assert_eq!(result.column_names(), vec!["region", "amount", "price"]);
    assert_eq!(
        result.column_types(),
        &[ColumnType::Utf8, ColumnType::Int64, ColumnType::Float64]
    );
}

#[test]
fn test_numeric_function_on_text_is_rejected() {
    let err = group_by(
        &sales(),
        &by(&["region"]),
        &[Aggregation::single("product", AggFunction::Mean)],
    )
    .unwrap_err();
    assert!(matches!(err, OperationError::InvalidAggregation { .. }));
    assert!(err.to_string().contains("product"));
}

#[test]
fn test_argument_errors() {
    let no_keys = group_by(&sales(), &[], &[]).unwrap_err();
    assert!(matches!(no_keys, OperationError::InvalidArgument { .. }));

    let unknown = group_by(
        &sales(),
        &by(&["regoin"]),
        &[Aggregation::single("amount", AggFunction::Sum)],
    )
    .unwrap_err();
    assert_eq!(unknown.suggestion().as_deref(), Some("Did you mean 'region'?"));
}

#[test]
fn test_colliding_output_names_are_rejected() {
    let table = Table::from_scalars(vec![
        ("k".into(), ColumnType::Utf8, text(&[Some("a"), Some("b")])),
        ("v".into(), ColumnType::Int64, vec![Scalar::Int(1), Scalar::Int(2)]),
        ("v_sum".into(), ColumnType::Int64, vec![Scalar::Int(3), Scalar::Int(4)]),
    ])
    .unwrap();

    let err = group_by(
        &table,
        &by(&["k"]),
        &[
            Aggregation::new("v", vec![AggFunction::Sum, AggFunction::Mean]),
            Aggregation::single("v_sum", AggFunction::Max),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, OperationError::DuplicateOutput { .. }));
    assert_eq!(err.kind(), "InvalidArgument");
    assert!(err.to_string().contains("'v_sum'"));
    assert!(err.suggestion().is_some());

    // An output may not shadow a group column either
    let err = group_by(
        &table,
        &by(&["v_sum"]),
        &[Aggregation::new("v", vec![AggFunction::Sum, AggFunction::Mean])],
    )
    .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[test]
fn test_function_names_parse() {
    assert_eq!("avg".parse::<AggFunction>().unwrap(), AggFunction::Mean);
    assert_eq!(" SUM ".parse::<AggFunction>().unwrap(), AggFunction::Sum);
    assert_eq!("count_distinct".parse::<AggFunction>().unwrap(), AggFunction::Nunique);
    let err = "mode".parse::<AggFunction>().unwrap_err();
    assert!(err.contains("nunique"));
}

#[test]
fn test_quantile_interpolates() {
    let sorted = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(quantile(&sorted, 0.5), Some(2.5));
    assert_eq!(quantile(&sorted, 0.25), Some(1.75));
    assert_eq!(quantile(&[], 0.5), None);
}
