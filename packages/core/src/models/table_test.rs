//! Tests for Table construction, memory estimation and row views

use super::*;
use arrow_array::{BooleanArray, Float64Array, Int64Array, Int32Array, StringArray};
use serde_json::json;

fn sample_table() -> Table {
    Table::try_from_columns(vec![
        ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        (
            "name",
            Arc::new(StringArray::from(vec![Some("ab"), None, Some("cde")])) as ArrayRef,
        ),
        (
            "value",
            Arc::new(Float64Array::from(vec![1.5, 2.5, 3.5])) as ArrayRef,
        ),
    ])
    .unwrap()
}

#[test]
fn test_basic_shape() {
    let table = sample_table();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.num_columns(), 3);
    assert_eq!(table.column_names(), vec!["id", "name", "value"]);
    assert_eq!(
        table.column_types(),
        &[ColumnType::Int64, ColumnType::Utf8, ColumnType::Float64]
    );
    assert_eq!(table.column_index("value"), Some(2));
    assert_eq!(table.column_index("missing"), None);
}

#[test]
fn test_rejects_empty_column_list() {
    let result = Table::try_from_columns::<&str>(vec![]);
    assert!(matches!(result, Err(TableError::NoColumns)));
}

#[test]
fn test_rejects_duplicate_names() {
    let result = Table::try_from_columns(vec![
        ("a", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ("a", Arc::new(Int64Array::from(vec![2])) as ArrayRef),
    ]);
    assert!(matches!(result, Err(TableError::DuplicateColumn(name)) if name == "a"));
}

#[test]
fn test_rejects_unequal_lengths() {
    let result = Table::try_from_columns(vec![
        ("a", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
        ("b", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
    ]);
    match result {
        Err(TableError::LengthMismatch {
            column,
            expected,
            actual,
        }) => {
            assert_eq!(column, "b");
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected length mismatch, got {:?}", other),
    }
}

#[test]
fn test_rejects_unsupported_types() {
    let result = Table::try_from_columns(vec![(
        "small",
        Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
    )]);
    assert!(matches!(result, Err(TableError::UnsupportedType { .. })));
}

#[test]
fn test_from_batch_normalizes_nullability() {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "flag",
        arrow_schema::DataType::Boolean,
        false,
    )]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef],
    )
    .unwrap();

    let table = Table::from_batch(batch).unwrap();
    assert!(table.schema().field(0).is_nullable());

    let rebuilt = Table::try_from_columns(vec![(
        "flag",
        Arc::new(BooleanArray::from(vec![true, false])) as ArrayRef,
    )])
    .unwrap();
    assert_eq!(table, rebuilt);
}

#[test]
fn test_memory_estimate_counts_text_bytes() {
    let table = sample_table();
    // id: 8 * 3, name: 4 * 3 + 5 bytes of text, value: 8 * 3
    assert_eq!(table.estimated_memory_bytes(), 24 + 12 + 5 + 24);
}

#[test]
fn test_memory_estimate_of_sliced_text_column() {
    let strings = StringArray::from(vec!["aaaa", "bb", "c"]);
    let sliced = strings.slice(1, 2);
    let table = Table::try_from_columns(vec![("s", Arc::new(sliced) as ArrayRef)]).unwrap();
    assert_eq!(table.estimated_memory_bytes(), 4 * 2 + 3);
}

#[test]
fn test_row_view_preserves_order_and_nulls() {
    let rows = sample_table().to_rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.columns, vec!["id", "name", "value"]);
    assert_eq!(rows.get(1, "name"), Some(&Scalar::Null));
    assert_eq!(rows.get(2, "name"), Some(&Scalar::Text("cde".to_string())));

    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[1], json!({"id": 2, "name": null, "value": 2.5}));

    let records = rows.to_records();
    let keys: Vec<&String> = records[0].keys().collect();
    assert_eq!(keys, vec!["id", "name", "value"]);
}

#[test]
fn test_slice_rows_clamps_bounds() {
    let table = sample_table();
    assert_eq!(table.slice_rows(1, Some(10)).len(), 2);
    assert_eq!(table.slice_rows(5, Some(1)).len(), 0);
    assert_eq!(table.slice_rows(0, Some(0)).len(), 0);
}

#[test]
fn test_from_scalars() {
    let table = Table::from_scalars(vec![(
        "ts".to_string(),
        ColumnType::Timestamp,
        vec![Scalar::Timestamp(0), Scalar::Null],
    )])
    .unwrap();
    assert_eq!(table.column_type(0), ColumnType::Timestamp);
    assert_eq!(table.value(0, 0), Scalar::Timestamp(0));
    assert_eq!(table.value(1, 0), Scalar::Null);
}

#[test]
fn test_clone_shares_buffers() {
    let table = sample_table();
    let copy = table.clone();
    assert_eq!(table, copy);
    assert!(Arc::ptr_eq(table.column(0), copy.column(0)));
}
