//! Service Layer Error Types
//!
//! Composes the per-layer errors and adds the failures that only exist once
//! work is scheduled: row-limit rejection, I/O timeouts and cancelled tasks.

use crate::datastore::{check_row_limit, RegistryError};
use crate::ingest::IngestError;
use crate::operations::OperationError;
use thiserror::Error;

/// Data service errors
#[derive(Error, Debug)]
pub enum DataServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Parsed row count is over the ceiling and the policy is `reject`
    #[error("Row limit exceeded: {row_count} rows, limit is {limit}")]
    RowLimitExceeded { row_count: usize, limit: usize },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// The blocking task was cancelled before it produced a table
    #[error("{operation} was cancelled")]
    TaskCancelled { operation: String },
}

impl DataServiceError {
    pub fn row_limit_exceeded(row_count: usize, limit: usize) -> Self {
        Self::RowLimitExceeded { row_count, limit }
    }

    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    pub fn task_cancelled(operation: impl Into<String>) -> Self {
        Self::TaskCancelled {
            operation: operation.into(),
        }
    }

    /// Taxonomy name reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(RegistryError::NotFound { .. }) => "NotFound",
            Self::Registry(RegistryError::DuplicateHandle { .. }) => "DuplicateHandle",
            Self::Registry(RegistryError::InvalidHandle { .. }) => "InvalidHandle",
            Self::Operation(err) => err.kind(),
            Self::Ingest(err) => err.kind(),
            Self::RowLimitExceeded { .. } => "RowLimitExceeded",
            Self::Timeout { .. } => "Timeout",
            Self::TaskCancelled { .. } => "TaskCancelled",
        }
    }

    /// Remediation hint, when one is known
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Registry(RegistryError::NotFound { available, .. }) if available.is_empty() => {
                Some("No tables are loaded; load one with read_csv, read_parquet or read_json".to_string())
            }
            Self::Registry(RegistryError::NotFound { available, .. }) => {
                Some(format!("Available handles: {}", available.join(", ")))
            }
            Self::Registry(RegistryError::DuplicateHandle { handle }) => Some(format!(
                "Drop '{}' first, choose another name, or omit the name to get a generated handle",
                handle
            )),
            Self::Registry(RegistryError::InvalidHandle { .. }) => {
                Some("Use a name without spaces, such as 'sales_2024'".to_string())
            }
            Self::Operation(err) => err.suggestion(),
            Self::Ingest(err) => err.suggestion(),
            Self::RowLimitExceeded { row_count, limit } => {
                check_row_limit(*row_count, *limit).suggestion
            }
            Self::Timeout { .. } => Some(
                "Read fewer rows or columns, or raise DATA_PLATFORM_IO_TIMEOUT_SECS".to_string(),
            ),
            Self::TaskCancelled { .. } => None,
        }
    }
}
