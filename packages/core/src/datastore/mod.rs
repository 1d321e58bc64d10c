//! Table Store
//!
//! The in-memory registry that owns every table the server knows about:
//!
//! - Handle assignment (caller-supplied or generated) with collision checks
//! - Cached per-table metadata and summed memory accounting
//! - Row-limit policy checks
//!
//! Tables live until they are explicitly dropped or the registry is cleared;
//! there is no eviction.

mod error;
pub mod registry;

pub use error::RegistryError;
pub use registry::{
    check_row_limit, generate_auto_handle, RowLimitCheck, TableRegistry, AUTO_HANDLE_PREFIX,
    DEFAULT_MAX_ROWS,
};
