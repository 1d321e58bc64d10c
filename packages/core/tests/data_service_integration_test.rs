//! Integration tests for DataService with real files and concurrent callers
//!
//! These tests exercise ingest, the relational operations and export
//! end-to-end through the public service API.

use data_platform_core::config::{DataPlatformConfig, RowLimitPolicy};
use data_platform_core::ingest::{DataFormat, ReadOptions};
use data_platform_core::operations::{AggFunction, Aggregation, JoinType, SortKey};
use data_platform_core::services::{DataService, DataServiceError};
use data_platform_core::{ColumnType, Scalar};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

/// Test helper: a service whose project directory is a fresh temp dir
fn create_test_env(config: DataPlatformConfig) -> (Arc<DataService>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = DataPlatformConfig {
        project_dirs: vec![temp_dir.path().to_path_buf()],
        ..config
    };
    (Arc::new(DataService::from_config(config)), temp_dir)
}

fn write_file(dir: &TempDir, name: &str, contents: &str) {
    std::fs::write(dir.path().join(name), contents).unwrap();
}

fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

const SALES_CSV: &str = "\
date,region,product,units,price
2024-01-03,north,widget,4,2.50
2024-01-03,south,widget,1,2.50
2024-01-04,north,gadget,2,10.00
2024-01-05,east,gadget,,10.00
2024-01-05,south,gizmo,7,1.25
2024-01-06,north,gizmo,3,1.25
";

// ============================================================================
// Ingest and export
// ============================================================================

#[tokio::test]
async fn test_csv_types_are_inferred() {
    let (service, dir) = create_test_env(DataPlatformConfig::default());
    write_file(&dir, "sales.csv", SALES_CSV);

    let loaded = service
        .load_file("sales.csv", None, ReadOptions::default(), Some("sales".into()))
        .await
        .unwrap();
    assert_eq!(loaded.table.rows, 6);
    assert_eq!(loaded.format, DataFormat::Csv);
    assert!(loaded.warning.is_none());

    let info = service.info("sales").await.unwrap();
    let types: Vec<ColumnType> = info.columns.iter().map(|c| c.dtype).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::Timestamp,
            ColumnType::Utf8,
            ColumnType::Utf8,
            ColumnType::Int64,
            ColumnType::Float64,
        ]
    );

    let page = service.get_data("sales", 3, Some(1)).await.unwrap();
    assert_eq!(page.data.get(0, "units"), Some(&Scalar::Null));
}

#[tokio::test]
async fn test_sales_pipeline_round_trips_through_json() {
    let (service, dir) = create_test_env(DataPlatformConfig::default());
    write_file(&dir, "sales.csv", SALES_CSV);
    service
        .load_file("sales.csv", None, ReadOptions::default(), Some("sales".into()))
        .await
        .unwrap();

    let sold = service
        .filter("sales", "units >= 2 and product != 'gadget'", None)
        .await
        .unwrap();
    assert_eq!(sold.rows, 3);

    let by_region = service
        .group_by(
            &sold.handle,
            vec!["region".into()],
            vec![Aggregation::new(
                "units",
                vec![AggFunction::Sum, AggFunction::Count],
            )],
            Some("by_region".into()),
        )
        .await
        .unwrap();
    assert_eq!(by_region.column_names, vec!["region", "units_sum", "units_count"]);

    let sorted = service
        .sort("by_region", vec![SortKey::descending("units_sum")], None)
        .await
        .unwrap();

    let exported = service
        .export(&sorted.handle, "summary.json", None, None)
        .await
        .unwrap();
    assert_eq!(exported.format, DataFormat::Json);
    assert!(dir.path().join("summary.json").is_file());

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(
        written,
        json!([
            {"region": "north", "units_sum": 7, "units_count": 2},
            {"region": "south", "units_sum": 7, "units_count": 1}
        ])
    );

    // Every intermediate table is still there, untouched
    assert_eq!(service.list().await.len(), 4);
    assert_eq!(service.info("sales").await.unwrap().row_count, 6);
}

#[tokio::test]
async fn test_column_and_row_selection_on_load() {
    let (service, dir) = create_test_env(DataPlatformConfig::default());
    write_file(&dir, "sales.tsv", &SALES_CSV.replace(',', "\t"));

    let loaded = service
        .load_file(
            "sales.tsv",
            None,
            ReadOptions {
                columns: Some(vec!["price".into(), "region".into()]),
                limit: Some(2),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(loaded.format, DataFormat::Tsv);
    assert_eq!(loaded.table.column_names, vec!["price", "region"]);
    assert_eq!(loaded.table.rows, 2);
}

#[tokio::test]
async fn test_unreadable_input_is_reported_not_raised() {
    let (service, dir) = create_test_env(DataPlatformConfig::default());
    write_file(&dir, "broken.json", "[{\"a\": 1}, ");
    write_file(&dir, "notes.docx", "hello");

    let err = assert_err!(
        service
            .load_file("broken.json", None, ReadOptions::default(), None)
            .await
    );
    assert!(matches!(err, DataServiceError::Ingest(_)));

    let err = assert_err!(
        service
            .load_file("notes.docx", None, ReadOptions::default(), None)
            .await
    );
    assert_eq!(err.kind(), "UnsupportedFormat");
    assert!(service.list().await.is_empty());
}

// ============================================================================
// Row limits
// ============================================================================

#[tokio::test]
async fn test_check_row_limit_against_configured_ceiling() {
    let (service, _dir) = create_test_env(DataPlatformConfig {
        max_rows: 100,
        ..Default::default()
    });

    let over = service.check_row_limit(150);
    assert!(over.exceeded);
    assert_eq!(over.limit, 100);
    assert!(!over.suggestion.unwrap_or_default().is_empty());

    let under = service.check_row_limit(50);
    assert!(!under.exceeded);
    assert!(under.suggestion.is_none());
}

#[tokio::test]
async fn test_reject_policy_refuses_oversized_records() {
    let (service, _dir) = create_test_env(DataPlatformConfig {
        max_rows: 2,
        row_limit_policy: RowLimitPolicy::Reject,
        ..Default::default()
    });

    let records: Vec<_> = (0..3).map(|i| record(json!({"n": i}))).collect();
    let err = assert_err!(service.load_records(records, None).await);
    assert_eq!(err.kind(), "RowLimitExceeded");

    let records: Vec<_> = (0..2).map(|i| record(json!({"n": i}))).collect();
    assert_ok!(service.load_records(records, Some("small".into())).await);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_get_distinct_handles() {
    let (service, _dir) = create_test_env(DataPlatformConfig::default());

    let mut tasks = Vec::new();
    for i in 0..32 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let records = vec![record(json!({"i": i}))];
            service.load_records(records, None).await.unwrap().table.handle
        }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), 32);
    assert_eq!(service.list().await.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_name_has_one_winner() {
    let (service, _dir) = create_test_env(DataPlatformConfig::default());

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let records = vec![record(json!({"i": i}))];
            service.load_records(records, Some("shared".into())).await
        }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.kind(), "DuplicateHandle"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_drop_during_reads_is_all_or_nothing() {
    let (service, _dir) = create_test_env(DataPlatformConfig::default());
    let records: Vec<_> = (0..100).map(|i| record(json!({"i": i}))).collect();
    service
        .load_records(records, Some("victim".into()))
        .await
        .unwrap();

    let mut readers = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        readers.push(tokio::spawn(async move {
            service.get_data("victim", 0, None).await
        }));
    }
    assert!(service.drop_table("victim").await);

    for reader in readers {
        match reader.await.unwrap() {
            Ok(page) => assert_eq!(page.returned, 100),
            Err(e) => assert_eq!(e.kind(), "NotFound"),
        }
    }
}

#[tokio::test]
async fn test_join_kinds_over_loaded_files() {
    let (service, dir) = create_test_env(DataPlatformConfig::default());
    write_file(&dir, "people.csv", "id,name\n1,ann\n2,bob\n3,cyd\n");
    write_file(&dir, "scores.csv", "id,score\n2,80\n3,95\n4,70\n");
    for (file, name) in [("people.csv", "people"), ("scores.csv", "scores")] {
        service
            .load_file(file, None, ReadOptions::default(), Some(name.into()))
            .await
            .unwrap();
    }

    let expected = [
        (JoinType::Inner, 2),
        (JoinType::Left, 3),
        (JoinType::Right, 3),
        (JoinType::Outer, 4),
    ];
    for (how, rows) in expected {
        let joined = service
            .join("people", "scores", vec!["id".into()], how, None)
            .await
            .unwrap();
        assert_eq!(joined.rows, rows, "{} join", how);
        assert_eq!(joined.column_names, vec!["id", "name", "score"]);
    }
}
