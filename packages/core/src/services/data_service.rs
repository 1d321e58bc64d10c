//! Data Service
//!
//! Business logic layer between the MCP handlers and the table registry:
//!
//! - Ingest and export with path resolution, an I/O timeout and the row-limit policy
//! - Relational operations that read source tables and publish derived ones
//! - Registry inspection (list, info, paging, memory usage)
//!
//! # Construct, then publish
//!
//! Every derived table is computed on the blocking pool from an immutable
//! snapshot of its inputs and only then stored. A request that fails or is
//! cancelled part-way leaves nothing behind under any handle.

use crate::config::{DataPlatformConfig, RowLimitPolicy};
use crate::datastore::{RegistryError, RowLimitCheck, TableRegistry};
use crate::ingest::records::{records_to_table, Record};
use crate::ingest::{self, DataFormat, IngestError, ReadOptions};
use crate::models::{bytes_to_mb, RowOrientedView, Table, TableMetadata};
use crate::operations::{self, Aggregation, JoinType, OperationError, SortKey};
use crate::services::DataServiceError;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};

/// Summary of a newly stored table, enough to chain another operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedTable {
    pub handle: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    #[serde(flatten)]
    pub table: DerivedTable,
    pub path: String,
    pub format: DataFormat,
    pub memory_bytes: u64,
    /// Set when the row count is over the ceiling under the `warn` policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub handle: String,
    pub path: String,
    pub format: DataFormat,
    pub rows: usize,
    pub bytes: u64,
}

/// A window of rows from one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPage {
    pub handle: String,
    pub total_rows: usize,
    pub offset: usize,
    pub returned: usize,
    pub columns: Vec<String>,
    pub data: RowOrientedView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMemory {
    pub handle: String,
    pub memory_bytes: u64,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub table_count: usize,
    pub total_bytes: u64,
    pub total_mb: f64,
    pub tables: Vec<TableMemory>,
}

/// Shared data service
///
/// One instance is built at startup and shared (behind an `Arc`) by every
/// request handler.
#[derive(Debug, Clone)]
pub struct DataService {
    registry: Arc<TableRegistry>,
    config: Arc<DataPlatformConfig>,
}

impl DataService {
    pub fn new(registry: Arc<TableRegistry>, config: Arc<DataPlatformConfig>) -> Self {
        Self { registry, config }
    }

    /// Build a service with a fresh registry sized from `config`
    pub fn from_config(config: DataPlatformConfig) -> Self {
        let registry = Arc::new(TableRegistry::with_max_rows(config.max_rows));
        Self::new(registry, Arc::new(config))
    }

    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DataPlatformConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Ingest and export
    // ---------------------------------------------------------------------

    /// Read a file and store it.
    ///
    /// `format` overrides the extension. Relative paths are resolved against
    /// the working directory and then the configured project directories.
    #[instrument(skip(self, options))]
    pub async fn load_file(
        &self,
        path: &str,
        format: Option<DataFormat>,
        options: ReadOptions,
        name: Option<String>,
    ) -> Result<LoadOutcome, DataServiceError> {
        self.ensure_handle_free(name.as_deref()).await?;

        let requested = path.to_string();
        let project_dirs = self.config.project_dirs.clone();
        let (resolved, format, table) = self
            .with_io_timeout(format!("Reading {}", path), move || {
                let resolved = ingest::resolve_input_path(&requested, &project_dirs)?;
                let format = DataFormat::resolve(format, &resolved)?;
                let table = ingest::read_file(&resolved, format, &options)?;
                Ok((resolved, format, table))
            })
            .await?;

        let warning = self.apply_row_limit(table.num_rows())?;
        let memory_bytes = table.estimated_memory_bytes();
        let source = format!("{} file {}", format, resolved.display());
        let table = self.publish(table, name, source).await?;

        info!(
            "📥 Loaded {} rows x {} columns from {} as '{}'",
            table.rows,
            table.columns,
            resolved.display(),
            table.handle
        );
        Ok(LoadOutcome {
            table,
            path: resolved.display().to_string(),
            format,
            memory_bytes,
            warning,
        })
    }

    /// Store records supplied inline by the caller
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn load_records(
        &self,
        records: Vec<Record>,
        name: Option<String>,
    ) -> Result<LoadOutcome, DataServiceError> {
        self.ensure_handle_free(name.as_deref()).await?;

        let table = run_blocking("Building table from records", move || {
            records_to_table(records, &ReadOptions::default()).map_err(DataServiceError::from)
        })
        .await?;

        let warning = self.apply_row_limit(table.num_rows())?;
        let memory_bytes = table.estimated_memory_bytes();
        let table = self
            .publish(table, name, "inline records".to_string())
            .await?;
        Ok(LoadOutcome {
            table,
            path: String::new(),
            format: DataFormat::Json,
            memory_bytes,
            warning,
        })
    }

    /// Write a stored table to a file, replacing any existing file
    #[instrument(skip(self))]
    pub async fn export(
        &self,
        handle: &str,
        path: &str,
        format: Option<DataFormat>,
        delimiter: Option<u8>,
    ) -> Result<ExportOutcome, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let rows = table.num_rows();
        let target = ingest::resolve_output_path(path, &self.config.project_dirs);

        let (target, format, bytes) = self
            .with_io_timeout(format!("Writing {}", target.display()), move || {
                let format = DataFormat::resolve(format, &target)?;
                let bytes = ingest::write_file(&table, &target, format, delimiter)?;
                Ok((target, format, bytes))
            })
            .await?;

        info!(
            "📤 Exported '{}' ({} rows) to {} as {}",
            handle,
            rows,
            target.display(),
            format
        );
        Ok(ExportOutcome {
            handle: handle.to_string(),
            path: target.display().to_string(),
            format,
            rows,
            bytes,
        })
    }

    // ---------------------------------------------------------------------
    // Relational operations
    // ---------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn filter(
        &self,
        handle: &str,
        condition: &str,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("filter({}: {})", handle, condition);
        let condition = condition.to_string();
        self.derive("filter", name, source, move || {
            operations::filter(&table, &condition)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn select(
        &self,
        handle: &str,
        columns: Vec<String>,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("select({}: {})", handle, columns.join(", "));
        self.derive("select", name, source, move || {
            operations::select(&table, &columns)
        })
        .await
    }

    #[instrument(skip(self, aggregations))]
    pub async fn group_by(
        &self,
        handle: &str,
        by: Vec<String>,
        aggregations: Vec<Aggregation>,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("groupby({}: {})", handle, by.join(", "));
        self.derive("groupby", name, source, move || {
            operations::group_by(&table, &by, &aggregations)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn join(
        &self,
        left_handle: &str,
        right_handle: &str,
        on: Vec<String>,
        how: JoinType,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let left = self.registry.get(left_handle).await?;
        let right = self.registry.get(right_handle).await?;
        let source = format!("{} join({}, {})", how, left_handle, right_handle);
        self.derive("join", name, source, move || {
            operations::join(&left, &right, &on, how)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn sort(
        &self,
        handle: &str,
        keys: Vec<SortKey>,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let columns: Vec<&str> = keys.iter().map(|k| k.column.as_str()).collect();
        let source = format!("sort({}: {})", handle, columns.join(", "));
        self.derive("sort", name, source, move || operations::sort(&table, &keys))
            .await
    }

    pub async fn head(
        &self,
        handle: &str,
        n: usize,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("head({}, {})", handle, n);
        self.derive("head", name, source, move || Ok(operations::head(&table, n)))
            .await
    }

    pub async fn tail(
        &self,
        handle: &str,
        n: usize,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("tail({}, {})", handle, n);
        self.derive("tail", name, source, move || Ok(operations::tail(&table, n)))
            .await
    }

    /// Summary statistics of the numeric columns, stored as a new table
    #[instrument(skip(self))]
    pub async fn describe(
        &self,
        handle: &str,
        name: Option<String>,
    ) -> Result<DerivedTable, DataServiceError> {
        let table = self.registry.get(handle).await?;
        let source = format!("describe({})", handle);
        self.derive("describe", name, source, move || operations::describe(&table))
            .await
    }

    // ---------------------------------------------------------------------
    // Registry inspection
    // ---------------------------------------------------------------------

    pub async fn list(&self) -> Vec<TableMetadata> {
        self.registry.list().await
    }

    pub async fn info(&self, handle: &str) -> Result<TableMetadata, DataServiceError> {
        Ok(self.registry.get_metadata(handle).await?)
    }

    /// Rows `offset..offset + limit` of a table as records
    pub async fn get_data(
        &self,
        handle: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<DataPage, DataServiceError> {
        let metadata = self.registry.get_metadata(handle).await?;
        let data = self
            .registry
            .get_as_row_oriented(handle, offset, limit)
            .await?;
        Ok(DataPage {
            handle: handle.to_string(),
            total_rows: metadata.row_count,
            offset,
            returned: data.len(),
            columns: data.columns.clone(),
            data,
        })
    }

    /// Remove a table; `false` when it was already absent
    #[instrument(skip(self))]
    pub async fn drop_table(&self, handle: &str) -> bool {
        self.registry.drop_table(handle).await
    }

    /// Remove every table; returns how many were removed
    #[instrument(skip(self))]
    pub async fn clear(&self) -> usize {
        let count = self.registry.len().await;
        self.registry.clear().await;
        info!("🧹 Cleared {} tables", count);
        count
    }

    pub async fn memory_usage(&self) -> MemoryUsage {
        let tables: Vec<TableMemory> = self
            .registry
            .list()
            .await
            .into_iter()
            .map(|metadata| TableMemory {
                memory_mb: metadata.memory_mb(),
                handle: metadata.handle,
                memory_bytes: metadata.memory_bytes,
            })
            .collect();
        let total_bytes = tables.iter().map(|t| t.memory_bytes).sum();
        MemoryUsage {
            table_count: tables.len(),
            total_bytes,
            total_mb: bytes_to_mb(total_bytes),
            tables,
        }
    }

    pub fn check_row_limit(&self, row_count: usize) -> RowLimitCheck {
        self.registry.check_row_limit(row_count)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Early collision check for a caller-chosen handle; the store repeats it
    /// atomically
    async fn ensure_handle_free(&self, name: Option<&str>) -> Result<(), DataServiceError> {
        match name {
            Some(handle) if self.registry.contains(handle).await => {
                Err(RegistryError::duplicate_handle(handle).into())
            }
            _ => Ok(()),
        }
    }

    /// Warning text under `warn`, an error under `reject`
    fn apply_row_limit(&self, row_count: usize) -> Result<Option<String>, DataServiceError> {
        let check = self.registry.check_row_limit(row_count);
        if !check.exceeded {
            return Ok(None);
        }
        match self.config.row_limit_policy {
            RowLimitPolicy::Reject => {
                warn!(
                    "⚠️  Rejecting load of {} rows (limit {})",
                    check.row_count, check.limit
                );
                Err(DataServiceError::row_limit_exceeded(
                    check.row_count,
                    check.limit,
                ))
            }
            RowLimitPolicy::Warn => {
                warn!(
                    "⚠️  Loading {} rows, over the limit of {}",
                    check.row_count, check.limit
                );
                Ok(check.suggestion)
            }
        }
    }

    async fn derive<F>(
        &self,
        operation: &'static str,
        name: Option<String>,
        source: String,
        work: F,
    ) -> Result<DerivedTable, DataServiceError>
    where
        F: FnOnce() -> Result<Table, OperationError> + Send + 'static,
    {
        self.ensure_handle_free(name.as_deref()).await?;
        let table = run_blocking(operation, move || work().map_err(DataServiceError::from)).await?;
        debug!(
            "{} produced {} rows x {} columns",
            operation,
            table.num_rows(),
            table.num_columns()
        );
        self.publish(table, name, source).await
    }

    async fn publish(
        &self,
        table: Table,
        name: Option<String>,
        source: String,
    ) -> Result<DerivedTable, DataServiceError> {
        let rows = table.num_rows();
        let columns = table.num_columns();
        let column_names = table.column_names();
        let handle = self.registry.store(table, name, Some(source)).await?;
        Ok(DerivedTable {
            handle,
            rows,
            columns,
            column_names,
        })
    }

    async fn with_io_timeout<T, F>(&self, operation: String, work: F) -> Result<T, DataServiceError>
    where
        F: FnOnce() -> Result<T, IngestError> + Send + 'static,
        T: Send + 'static,
    {
        let task = run_blocking(&operation, move || work().map_err(DataServiceError::from));
        match tokio::time::timeout(self.config.io_timeout(), task).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "⏱️  {} timed out after {}s",
                    operation, self.config.io_timeout_secs
                );
                Err(DataServiceError::timeout(
                    operation.as_str(),
                    self.config.io_timeout_secs,
                ))
            }
        }
    }
}

/// Run `work` on the blocking pool
async fn run_blocking<T, F>(operation: &str, work: F) -> Result<T, DataServiceError>
where
    F: FnOnce() -> Result<T, DataServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|err| Err(join_failure(operation, err)))
}

/// A panic in the worker is an invariant violation and is re-raised
fn join_failure(operation: &str, err: JoinError) -> DataServiceError {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    DataServiceError::task_cancelled(operation)
}

// Include tests
#[cfg(test)]
#[path = "data_service_test.rs"]
mod data_service_test;
