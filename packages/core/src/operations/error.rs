//! Error types for relational operations
//!
//! Every variant names the offending column, function or argument so the
//! message alone is enough for a caller to correct the request.

use crate::expression::ExpressionError;
use crate::models::TableError;
use crate::utils::closest_match;
use arrow_schema::ArrowError;
use thiserror::Error;

/// Errors that can occur while deriving a table from existing ones
#[derive(Error, Debug)]
pub enum OperationError {
    /// A referenced column is not in the source schema
    ///
    /// Always lists the valid names so the caller can recover.
    #[error("Column '{column}' not found. Available columns: {}", .available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    /// Join keys are missing on one side or have incompatible types
    #[error("Schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },

    /// The filter expression failed to parse, bind or type-check
    #[error("Invalid expression: {0}")]
    InvalidExpression(#[from] ExpressionError),

    /// An aggregation function cannot be applied to a column
    #[error("Cannot compute '{function}' of column '{column}': {reason}")]
    InvalidAggregation {
        column: String,
        function: String,
        reason: String,
    },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Two output columns of `operation` would share a name
    #[error("{operation} would produce column '{column}' twice")]
    DuplicateOutput {
        column: String,
        operation: &'static str,
    },

    /// The derived columns could not form a table
    #[error("Invalid result table: {0}")]
    Table(#[from] TableError),

    #[error("Arrow compute error: {0}")]
    Arrow(#[from] ArrowError),
}

impl OperationError {
    /// Unknown column error with the closest valid name attached
    pub fn unknown_column(column: impl Into<String>, available: Vec<String>) -> Self {
        let column = column.into();
        let suggestion = closest_match(&column, &available);
        Self::UnknownColumn {
            column,
            available,
            suggestion,
        }
    }

    pub fn schema_mismatch(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_aggregation(
        column: impl Into<String>,
        function: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidAggregation {
            column: column.into(),
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_output(column: impl Into<String>, operation: &'static str) -> Self {
        Self::DuplicateOutput {
            column: column.into(),
            operation,
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Taxonomy name reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownColumn { .. } => "UnknownColumn",
            Self::SchemaMismatch { .. } => "SchemaMismatch",
            Self::InvalidExpression(_) => "InvalidExpression",
            Self::InvalidAggregation { .. } => "InvalidAggregation",
            Self::InvalidArgument { .. } | Self::DuplicateOutput { .. } => "InvalidArgument",
            Self::Table(_) | Self::Arrow(_) => "InternalError",
        }
    }

    /// Remediation hint, when one is known
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnknownColumn {
                suggestion: Some(name),
                ..
            } => Some(format!("Did you mean '{}'?", name)),
            Self::UnknownColumn { available, .. } => {
                Some(format!("Use one of: {}", available.join(", ")))
            }
            Self::InvalidExpression(err) => err.suggestion(),
            Self::InvalidAggregation { .. } => Some(
                "sum, mean, median and std need a numeric column; count, nunique, min, max, \
                 first and last work on any column"
                    .to_string(),
            ),
            Self::SchemaMismatch { .. } => Some(
                "Join keys must exist in both tables with matching types (int64 and float64 \
                 keys are compatible)"
                    .to_string(),
            ),
            Self::DuplicateOutput {
                operation: "group_by",
                column,
            } => Some(format!(
                "Outputs are named column_function when renamed; choose aggregations that do not \
                 produce '{}' again",
                column
            )),
            Self::DuplicateOutput { column, .. } => Some(format!(
                "Leave '{}' out with select before this step",
                column
            )),
            _ => None,
        }
    }
}
