//! Tests for format resolution, path resolution and file round trips

use super::*;
use crate::models::{parse_timestamp, ColumnType, Scalar};
use tempfile::TempDir;

fn mixed_table() -> Table {
    Table::from_scalars(vec![
        (
            "id".into(),
            ColumnType::Int64,
            vec![Scalar::Int(1), Scalar::Int(2), Scalar::Null],
        ),
        (
            "price".into(),
            ColumnType::Float64,
            vec![Scalar::Float(9.5), Scalar::Null, Scalar::Float(1.25)],
        ),
        (
            "label".into(),
            ColumnType::Utf8,
            vec![
                Scalar::Text("a, quoted".into()),
                Scalar::Text("b".into()),
                Scalar::Null,
            ],
        ),
        (
            "flag".into(),
            ColumnType::Boolean,
            vec![Scalar::Bool(true), Scalar::Null, Scalar::Bool(false)],
        ),
        (
            "seen".into(),
            ColumnType::Timestamp,
            vec![
                Scalar::Timestamp(parse_timestamp("2024-05-01T08:30:00").unwrap()),
                Scalar::Null,
                Scalar::Timestamp(parse_timestamp("2024-05-02T00:00:00.5").unwrap()),
            ],
        ),
    ])
    .unwrap()
}

#[test]
fn test_format_from_extension() {
    assert_eq!(DataFormat::from_path(Path::new("a/b.CSV")), Some(DataFormat::Csv));
    assert_eq!(DataFormat::from_path(Path::new("b.tsv")), Some(DataFormat::Tsv));
    assert_eq!(DataFormat::from_path(Path::new("b.parquet")), Some(DataFormat::Parquet));
    assert_eq!(DataFormat::from_path(Path::new("b.ndjson")), Some(DataFormat::Jsonl));
    assert_eq!(DataFormat::from_path(Path::new("b")), None);

    let err = DataFormat::resolve(None, Path::new("data.xlsx")).unwrap_err();
    assert_eq!(err.kind(), "UnsupportedFormat");
    assert_eq!(
        DataFormat::resolve(Some(DataFormat::Json), Path::new("data.xlsx")).unwrap(),
        DataFormat::Json
    );
    assert_eq!("JSONL".parse::<DataFormat>().unwrap(), DataFormat::Jsonl);
}

#[test]
fn test_resolve_input_path_searches_project_dirs() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    std::fs::write(second.path().join("sales.csv"), "a\n1\n").unwrap();

    let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let found = resolve_input_path("sales.csv", &dirs).unwrap();
    assert_eq!(found, second.path().join("sales.csv"));

    let absolute = second.path().join("sales.csv");
    assert_eq!(
        resolve_input_path(absolute.to_str().unwrap(), &[]).unwrap(),
        absolute
    );
}

#[test]
fn test_missing_file_lists_searched_locations() {
    let dir = TempDir::new().unwrap();
    let err = resolve_input_path("missing.csv", &[dir.path().to_path_buf()]).unwrap_err();
    match err {
        IngestError::FileNotFound { path, searched } => {
            assert_eq!(path, "missing.csv");
            assert!(searched
                .iter()
                .any(|s| s.starts_with(&dir.path().display().to_string())));
        }
        other => panic!("expected FileNotFound, got {:?}", other),
    }
}

#[test]
fn test_output_path_uses_first_project_dir() {
    let dirs = vec![PathBuf::from("/data/out"), PathBuf::from("/data/other")];
    assert_eq!(
        resolve_output_path("result.csv", &dirs),
        PathBuf::from("/data/out/result.csv")
    );
    assert_eq!(
        resolve_output_path("/tmp/x.csv", &dirs),
        PathBuf::from("/tmp/x.csv")
    );
}

#[test]
fn test_round_trip_every_format() {
    let dir = TempDir::new().unwrap();
    let table = mixed_table();

    for format in [
        DataFormat::Csv,
        DataFormat::Tsv,
        DataFormat::Parquet,
        DataFormat::Json,
        DataFormat::Jsonl,
    ] {
        let path = dir.path().join(format!("table.{}", format));
        let bytes = write_file(&table, &path, format, None).unwrap();
        assert!(bytes > 0);

        let read = read_file(&path, format, &ReadOptions::default()).unwrap();
        assert_eq!(read.num_rows(), 3, "{}", format);
        assert_eq!(read.column_names(), table.column_names(), "{}", format);
        match format {
            // JSON keeps timestamps as text
            DataFormat::Json | DataFormat::Jsonl => {
                assert_eq!(read.column_type(4), ColumnType::Utf8);
                assert_eq!(read.value(0, 4), Scalar::Text("2024-05-01T08:30:00".into()));
                assert_eq!(read.value(2, 2), Scalar::Null);
            }
            _ => assert_eq!(read, table, "{}", format),
        }
    }
}

#[test]
fn test_read_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = read_file(&dir.path().join("nope.csv"), DataFormat::Csv, &ReadOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), "IoError");
}

#[test]
fn test_export_overwrites_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "stale\n").unwrap();

    let bytes = write_file(&mixed_table(), &path, DataFormat::Csv, None).unwrap();
    assert_eq!(bytes, std::fs::metadata(&path).unwrap().len());
    assert!(std::fs::read_to_string(&path).unwrap().starts_with("id,price,label"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_failed_write_keeps_previous_file() {
    use std::io::Write;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "id\n1\n2\n").unwrap();

    let err = replace_file(&path, |mut file| {
        file.write_all(b"id\n")?;
        Err(IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "writer gave up",
        )))
    })
    .unwrap_err();

    assert_eq!(err.kind(), "IoError");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n1\n2\n");
    // The staged file is removed with the error
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_export_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("out.csv");
    let err = write_file(&mixed_table(), &path, DataFormat::Csv, None).unwrap_err();
    assert_eq!(err.kind(), "IoError");
    assert!(!path.exists());
}
