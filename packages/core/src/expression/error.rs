//! Expression Error Types

use thiserror::Error;

/// Errors raised while tokenizing, parsing or binding a filter expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Expression is empty")]
    Empty,

    #[error("Expression is {length} characters long; the maximum is {max}")]
    TooLong { length: usize, max: usize },

    #[error("Expression nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("Unexpected character '{ch}' at position {position}{hint}")]
    UnexpectedCharacter {
        ch: char,
        position: usize,
        hint: String,
    },

    #[error("Unterminated {what} starting at position {position}")]
    Unterminated { what: &'static str, position: usize },

    #[error("Invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("Expected {expected} at position {position}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("Expected {expected} but the expression ended")]
    UnexpectedEnd { expected: String },

    #[error("Unknown column '{column}' in expression. Available columns: {}", .available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("Type error: {0}")]
    TypeMismatch(String),

    #[error("Expression must evaluate to a boolean, but it produces {0}")]
    NotBoolean(String),
}

impl ExpressionError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Remediation hint, when one is known
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnknownColumn {
                suggestion: Some(name),
                ..
            } => Some(format!("Did you mean '{}'?", name)),
            Self::UnknownColumn { .. } => Some(
                "Wrap column names containing spaces or punctuation in backticks, e.g. `unit price` > 3"
                    .to_string(),
            ),
            Self::NotBoolean(_) => {
                Some("Use a comparison such as `value > 25` or combine them with and/or".to_string())
            }
            _ => None,
        }
    }
}
