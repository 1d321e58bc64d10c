//! Ingest and Export
//!
//! Format adapters between external files and [`Table`]s:
//!
//! - `csv` / `tsv` delimited text with a header row ([`delimited`])
//! - `parquet` columnar files ([`columnar`])
//! - `json` arrays of records and `jsonl` one record per line ([`records`])
//!
//! Everything here is synchronous and does blocking file I/O; the service
//! layer runs it on the blocking pool under a timeout.

pub mod columnar;
pub mod delimited;
mod error;
pub mod infer;
pub mod records;

pub use error::IngestError;

use crate::models::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    Jsonl,
}

impl DataFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Some(DataFormat::Csv),
            "tsv" | "tab" => Some(DataFormat::Tsv),
            "parquet" | "pq" => Some(DataFormat::Parquet),
            "json" => Some(DataFormat::Json),
            "jsonl" | "ndjson" => Some(DataFormat::Jsonl),
            _ => None,
        }
    }

    /// Explicit format if given, else inferred from the extension
    pub fn resolve(explicit: Option<DataFormat>, path: &Path) -> Result<Self, IngestError> {
        explicit
            .or_else(|| Self::from_path(path))
            .ok_or_else(|| IngestError::UnsupportedFormat {
                format: path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "(no extension)".to_string()),
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Tsv => "tsv",
            DataFormat::Parquet => "parquet",
            DataFormat::Json => "json",
            DataFormat::Jsonl => "jsonl",
        }
    }

    fn default_delimiter(&self) -> u8 {
        match self {
            DataFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "tsv" => Ok(DataFormat::Tsv),
            "parquet" => Ok(DataFormat::Parquet),
            "json" => Ok(DataFormat::Json),
            "jsonl" | "ndjson" => Ok(DataFormat::Jsonl),
            other => Err(IngestError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Reader options shared by all formats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Field delimiter for delimited text; defaults to the format's own
    pub delimiter: Option<u8>,
    /// Columns to keep, in this order
    pub columns: Option<Vec<String>>,
    /// Maximum rows to read
    pub limit: Option<usize>,
}

/// Resolve an input path.
///
/// Absolute paths are used as-is. Relative paths are tried against the
/// working directory, then each project directory in order.
pub fn resolve_input_path(path: &str, project_dirs: &[PathBuf]) -> Result<PathBuf, IngestError> {
    let requested = Path::new(path);
    let mut candidates = Vec::new();
    if requested.is_absolute() {
        candidates.push(requested.to_path_buf());
    } else {
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(requested));
        }
        candidates.extend(project_dirs.iter().map(|dir| dir.join(requested)));
    }

    if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
        debug!("Resolved '{}' to {}", path, found.display());
        return Ok(found.clone());
    }
    Err(IngestError::FileNotFound {
        path: path.to_string(),
        searched: candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect(),
    })
}

/// Resolve an output path; relative paths are taken against the first
/// project directory, or the working directory when none is configured
pub fn resolve_output_path(path: &str, project_dirs: &[PathBuf]) -> PathBuf {
    let requested = Path::new(path);
    if requested.is_absolute() {
        return requested.to_path_buf();
    }
    match project_dirs.first() {
        Some(dir) => dir.join(requested),
        None => requested.to_path_buf(),
    }
}

/// Read a file into a table
pub fn read_file(path: &Path, format: DataFormat, options: &ReadOptions) -> Result<Table, IngestError> {
    let file = File::open(path)?;
    let table = match format {
        DataFormat::Csv | DataFormat::Tsv => {
            let delimiter = options.delimiter.unwrap_or(format.default_delimiter());
            delimited::read_csv(BufReader::new(file), delimiter, options)?
        }
        DataFormat::Parquet => columnar::read_parquet(file, options)?,
        DataFormat::Json => records::read_json(BufReader::new(file), options)?,
        DataFormat::Jsonl => records::read_json_lines(BufReader::new(file), options)?,
    };
    debug!(
        "Read {} rows x {} columns from {} as {}",
        table.num_rows(),
        table.num_columns(),
        path.display(),
        format
    );
    Ok(table)
}

/// Write a table to a file, replacing any existing file. Returns bytes written.
///
/// The target is only swapped in once the write finished, so a failed or
/// abandoned export leaves the previous file untouched.
pub fn write_file(
    table: &Table,
    path: &Path,
    format: DataFormat,
    delimiter: Option<u8>,
) -> Result<u64, IngestError> {
    let bytes = replace_file(path, |file| match format {
        DataFormat::Csv | DataFormat::Tsv => {
            let delimiter = delimiter.unwrap_or(format.default_delimiter());
            delimited::write_csv(table, BufWriter::new(file), delimiter)
        }
        DataFormat::Parquet => columnar::write_parquet(table, file),
        DataFormat::Json => records::write_json(table, BufWriter::new(file), false),
        DataFormat::Jsonl => records::write_json(table, BufWriter::new(file), true),
    })?;
    debug!("Wrote {} bytes to {} as {}", bytes, path.display(), format);
    Ok(bytes)
}

/// Run `write` against a temporary file next to `path`, then rename it over `path`
fn replace_file<F>(path: &Path, write: F) -> Result<u64, IngestError>
where
    F: FnOnce(File) -> Result<(), IngestError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)?;
    write(staged.as_file().try_clone()?)?;
    staged.as_file().sync_all()?;
    let file = staged.persist(path).map_err(|err| err.error)?;
    Ok(file.metadata()?.len())
}

// Include tests
#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;
