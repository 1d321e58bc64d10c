//! Filter Expression Language
//!
//! A small, pandas-query-like boolean expression language used by the filter
//! operation. Expressions are tokenized, parsed with a Pratt parser, then bound
//! to a table schema (name resolution and type checking) before being evaluated
//! row by row into a boolean mask.
//!
//! ```text
//! value > 25 and city in ['Oslo', 'Bergen']
//! not (`unit price` * qty >= 100) | flagged
//! seen >= '2024-03-01'
//! ```
//!
//! Expressions are data, never code: there is no function call syntax and no
//! access to anything outside the bound table.

mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use error::ExpressionError;
pub use eval::Predicate;
pub use parser::{parse, BinaryOp, Expr, MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_LENGTH};
