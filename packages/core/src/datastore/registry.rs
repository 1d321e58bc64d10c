//! In-memory table registry
//!
//! Maps opaque handles to immutable tables and their cached metadata.
//!
//! # Concurrency
//!
//! The handle map sits behind a single `tokio::sync::RwLock`. Each public
//! method takes the lock once and never awaits while holding it, so a store,
//! drop or clear is atomic with respect to every other operation. Metadata
//! statistics are computed before the write lock is taken; the critical
//! section only assigns the handle and sequence number and inserts.
//!
//! Readers receive a clone of the stored [`Table`], which shares the Arrow
//! buffers but cannot mutate them, so a concurrent drop never affects a table
//! that was already handed out.

use crate::datastore::RegistryError;
use crate::models::{bytes_to_mb, RowOrientedView, Table, TableMetadata, TableProfile};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Prefix of generated handles (`df_1a2b3c4d`)
pub const AUTO_HANDLE_PREFIX: &str = "df";

/// Default row-count ceiling
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// Hex characters in the random part of a generated handle (32 bits)
const AUTO_HANDLE_SUFFIX_LEN: usize = 8;

/// Outcome of a row-limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowLimitCheck {
    pub exceeded: bool,
    pub limit: usize,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Compare a proposed row count against a ceiling
pub fn check_row_limit(row_count: usize, limit: usize) -> RowLimitCheck {
    let exceeded = row_count > limit;
    let suggestion = exceeded.then(|| {
        format!(
            "{} rows exceeds the configured limit of {}. Apply a filter or sampling before \
             loading (read fewer columns or pass a row limit), or raise DATA_PLATFORM_MAX_ROWS.",
            row_count, limit
        )
    });
    RowLimitCheck {
        exceeded,
        limit,
        row_count,
        suggestion,
    }
}

/// Generate a candidate auto handle
pub fn generate_auto_handle() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", AUTO_HANDLE_PREFIX, &suffix[..AUTO_HANDLE_SUFFIX_LEN])
}

/// Draw candidates until one is not already live
fn unique_handle<F>(entries: &HashMap<String, RegistryEntry>, mut next: F) -> String
where
    F: FnMut() -> String,
{
    loop {
        let candidate = next();
        if !entries.contains_key(&candidate) {
            return candidate;
        }
        debug!("Generated handle {} collided, drawing again", candidate);
    }
}

fn validate_handle(handle: &str) -> Result<(), RegistryError> {
    if handle.is_empty() || handle.chars().any(char::is_whitespace) {
        return Err(RegistryError::invalid_handle(handle));
    }
    Ok(())
}

/// Table and metadata are created and destroyed together
#[derive(Debug)]
struct RegistryEntry {
    table: Table,
    metadata: TableMetadata,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<String, RegistryEntry>,
    next_sequence: u64,
}

impl RegistryState {
    fn sorted_handles(&self) -> Vec<String> {
        let mut handles: Vec<String> = self.entries.keys().cloned().collect();
        handles.sort();
        handles
    }

    fn not_found(&self, handle: &str) -> RegistryError {
        RegistryError::not_found(handle, self.sorted_handles())
    }
}

/// Shared table registry
///
/// Construct one per server and pass it (behind an `Arc`) to every component
/// that needs it.
#[derive(Debug)]
pub struct TableRegistry {
    state: RwLock<RegistryState>,
    max_rows: usize,
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRegistry {
    /// Create an empty registry with the default row ceiling
    pub fn new() -> Self {
        Self::with_max_rows(DEFAULT_MAX_ROWS)
    }

    /// Create an empty registry with a custom row ceiling
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            max_rows,
        }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Store a table and return its handle.
    ///
    /// With an explicit handle the store fails if the handle is live; it never
    /// overwrites. Without one a fresh `df_xxxxxxxx` handle is generated.
    #[instrument(skip(self, table, source), fields(rows = table.num_rows(), columns = table.num_columns()))]
    pub async fn store(
        &self,
        table: Table,
        handle: Option<String>,
        source: Option<String>,
    ) -> Result<String, RegistryError> {
        if let Some(handle) = &handle {
            validate_handle(handle)?;
        }
        let profile = TableProfile::of(&table);

        let mut state = self.state.write().await;
        let handle = match handle {
            Some(handle) => {
                if state.entries.contains_key(&handle) {
                    return Err(RegistryError::duplicate_handle(handle));
                }
                handle
            }
            None => unique_handle(&state.entries, generate_auto_handle),
        };

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let metadata = profile.into_metadata(handle.clone(), sequence, source);
        state
            .entries
            .insert(handle.clone(), RegistryEntry { table, metadata });

        debug!("Stored table '{}' (sequence {})", handle, sequence);
        Ok(handle)
    }

    /// Stored table in columnar form
    pub async fn get(&self, handle: &str) -> Result<Table, RegistryError> {
        let state = self.state.read().await;
        state
            .entries
            .get(handle)
            .map(|entry| entry.table.clone())
            .ok_or_else(|| state.not_found(handle))
    }

    /// Stored table converted to rows.
    ///
    /// The conversion runs after the lock is released, on a snapshot.
    pub async fn get_as_row_oriented(
        &self,
        handle: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<RowOrientedView, RegistryError> {
        let table = self.get(handle).await?;
        Ok(table.slice_rows(offset, limit))
    }

    pub async fn get_metadata(&self, handle: &str) -> Result<TableMetadata, RegistryError> {
        let state = self.state.read().await;
        state
            .entries
            .get(handle)
            .map(|entry| entry.metadata.clone())
            .ok_or_else(|| state.not_found(handle))
    }

    /// Metadata of every live table in insertion order
    pub async fn list(&self) -> Vec<TableMetadata> {
        let state = self.state.read().await;
        let mut all: Vec<TableMetadata> = state
            .entries
            .values()
            .map(|entry| entry.metadata.clone())
            .collect();
        all.sort_by_key(|metadata| metadata.sequence);
        all
    }

    /// Remove a table; returns whether it was present
    pub async fn drop_table(&self, handle: &str) -> bool {
        let removed = self.state.write().await.entries.remove(handle).is_some();
        debug!("Drop '{}': existed={}", handle, removed);
        removed
    }

    /// Remove every table
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let count = state.entries.len();
        state.entries.clear();
        debug!("Cleared {} tables", count);
    }

    pub async fn contains(&self, handle: &str) -> bool {
        self.state.read().await.entries.contains_key(handle)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Live handles, sorted
    pub async fn handles(&self) -> Vec<String> {
        self.state.read().await.sorted_handles()
    }

    /// Sum of the cached memory estimates of all live tables
    pub async fn total_memory_bytes(&self) -> u64 {
        let state = self.state.read().await;
        state
            .entries
            .values()
            .map(|entry| entry.metadata.memory_bytes)
            .sum()
    }

    pub async fn total_memory_megabytes(&self) -> f64 {
        bytes_to_mb(self.total_memory_bytes().await)
    }

    /// Check a proposed row count against this registry's ceiling
    pub fn check_row_limit(&self, row_count: usize) -> RowLimitCheck {
        check_row_limit(row_count, self.max_rows)
    }
}

// Include tests
#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
