//! Registry Error Types

use thiserror::Error;

/// Table registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No table is stored under the handle
    #[error("Table not found: '{handle}'")]
    NotFound {
        handle: String,
        available: Vec<String>,
    },

    /// Explicit store under a handle that is already live
    #[error("Handle already exists: '{handle}' (drop it first or choose another name)")]
    DuplicateHandle { handle: String },

    /// Caller-supplied handle is empty or contains whitespace
    #[error("Invalid handle '{handle}': handles must be non-empty and contain no whitespace")]
    InvalidHandle { handle: String },
}

impl RegistryError {
    /// Create a not found error listing the live handles
    pub fn not_found(handle: impl Into<String>, available: Vec<String>) -> Self {
        Self::NotFound {
            handle: handle.into(),
            available,
        }
    }

    /// Create a duplicate handle error
    pub fn duplicate_handle(handle: impl Into<String>) -> Self {
        Self::DuplicateHandle {
            handle: handle.into(),
        }
    }

    /// Create an invalid handle error
    pub fn invalid_handle(handle: impl Into<String>) -> Self {
        Self::InvalidHandle {
            handle: handle.into(),
        }
    }
}
