//! Data Models
//!
//! Value types shared by every layer:
//!
//! - [`ColumnType`] - supported column element types and their Arrow mapping
//! - [`Scalar`] - a single cell value
//! - [`Table`] - immutable columnar table backed by an Arrow `RecordBatch`
//! - [`TableMetadata`] - per-table attributes cached by the registry

pub mod column;
pub mod metadata;
pub mod table;
pub mod value;

pub use column::ColumnType;
pub use metadata::{bytes_to_mb, ColumnInfo, TableMetadata, TableProfile};
pub use table::{RowOrientedView, Table, TableError};
pub use value::{build_array, format_timestamp, parse_timestamp, Scalar};
