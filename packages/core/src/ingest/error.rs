//! Ingest and export error types

use crate::models::TableError;
use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Errors raised while reading or writing external files
#[derive(Error, Debug)]
pub enum IngestError {
    /// The path did not resolve to a file in any searched location
    #[error("File not found: '{path}' (searched: {})", .searched.join(", "))]
    FileNotFound { path: String, searched: Vec<String> },

    #[error("Unsupported format '{format}'. Supported formats: csv, tsv, parquet, json, jsonl")]
    UnsupportedFormat { format: String },

    /// A column's type has no supported equivalent
    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    /// A record-oriented column holds incompatible value kinds
    #[error("Column '{column}' mixes {first} and {second} values")]
    MixedTypes {
        column: String,
        first: String,
        second: String,
    },

    /// A requested column is absent from the file
    #[error("Column '{column}' not found in file. Available columns: {}", .available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Parse error at {location}: {message}")]
    Parse { location: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

impl IngestError {
    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_type(column: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            data_type: data_type.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "FileNotFound",
            Self::UnsupportedFormat { .. } => "UnsupportedFormat",
            Self::UnsupportedType { .. } => "UnsupportedType",
            Self::MixedTypes { .. } => "MixedTypes",
            Self::UnknownColumn { .. } => "UnknownColumn",
            Self::Parse { .. } | Self::Csv(_) | Self::Json(_) | Self::Table(_) => "ParseError",
            Self::Io(_) => "IoError",
            Self::Parquet(_) | Self::Arrow(_) => "FormatError",
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => Some(
                "Pass an absolute path, or add the containing directory to DATA_PLATFORM_PROJECT_DIRS"
                    .to_string(),
            ),
            Self::UnsupportedFormat { .. } => {
                Some("Use a .csv, .tsv, .parquet, .json or .jsonl file".to_string())
            }
            Self::MixedTypes { column, .. } => Some(format!(
                "Make every value of '{}' the same kind, or quote them all as strings",
                column
            )),
            Self::UnknownColumn { available, .. } => {
                Some(format!("Use one of: {}", available.join(", ")))
            }
            Self::Csv(_) => Some(
                "Check that every row has as many fields as the header and that the delimiter is right"
                    .to_string(),
            ),
            _ => None,
        }
    }
}
