//! Binding and row-wise evaluation
//!
//! Binding resolves column names to indices and type-checks the tree against a
//! table's schema, so evaluation never fails. Evaluation rules:
//!
//! - a comparison with a null operand is false
//! - `not`, `and`, `or` treat null as false
//! - integer overflow, division by zero and modulo by zero produce null
//! - `/` always produces a float

use crate::expression::parser::{parse, BinaryOp, Expr};
use crate::expression::ExpressionError;
use crate::models::{parse_timestamp, ColumnType, Scalar, Table};
use crate::utils::closest_match;
use arrow_array::BooleanArray;
use std::cmp::Ordering;
use std::fmt;

/// Static type of a bound sub-expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
    Null,
}

impl ValueType {
    fn of_column(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Int64 => ValueType::Int,
            ColumnType::Float64 => ValueType::Float,
            ColumnType::Utf8 => ValueType::Text,
            ColumnType::Boolean => ValueType::Bool,
            ColumnType::Timestamp => ValueType::Timestamp,
        }
    }

    fn of_scalar(value: &Scalar) -> Self {
        value
            .column_type()
            .map(Self::of_column)
            .unwrap_or(ValueType::Null)
    }

    fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// Whether values of the two types can be compared
    fn comparable(self, other: ValueType) -> bool {
        self == other
            || self == ValueType::Null
            || other == ValueType::Null
            || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Int => "int64",
            ValueType::Float => "float64",
            ValueType::Text => "utf8",
            ValueType::Bool => "boolean",
            ValueType::Timestamp => "timestamp",
            ValueType::Null => "null",
        })
    }
}

#[derive(Debug, Clone)]
enum Bound {
    Column(usize),
    Literal(Scalar),
    Not(Box<Bound>),
    Negate(Box<Bound>),
    Logical {
        and: bool,
        left: Box<Bound>,
        right: Box<Bound>,
    },
    Compare {
        op: BinaryOp,
        left: Box<Bound>,
        right: Box<Bound>,
    },
    Arithmetic {
        op: BinaryOp,
        left: Box<Bound>,
        right: Box<Bound>,
    },
    InList {
        expr: Box<Bound>,
        list: Vec<Scalar>,
        negated: bool,
    },
}

/// A filter expression bound to one table schema
#[derive(Debug, Clone)]
pub struct Predicate {
    root: Bound,
    columns: Vec<String>,
}

impl Predicate {
    /// Parse `expression` and bind it to `table`'s columns
    pub fn compile(expression: &str, table: &Table) -> Result<Self, ExpressionError> {
        let expr = parse(expression)?;
        Self::bind(&expr, table)
    }

    /// Bind an already parsed expression
    pub fn bind(expr: &Expr, table: &Table) -> Result<Self, ExpressionError> {
        let binder = Binder {
            names: table.column_names(),
            types: table.column_types(),
        };
        let (root, ty) = binder.bind(expr)?;
        if ty != ValueType::Bool {
            return Err(ExpressionError::NotBoolean(ty.to_string()));
        }
        let mut columns = Vec::new();
        collect_columns(&root, &binder.names, &mut columns);
        Ok(Self { root, columns })
    }

    /// Columns the expression reads
    pub fn referenced_columns(&self) -> &[String] {
        &self.columns
    }

    /// Evaluate for every row; rows where the result is not `true` are `false`
    pub fn evaluate(&self, table: &Table) -> BooleanArray {
        (0..table.num_rows())
            .map(|row| Some(truthy(&eval(&self.root, table, row))))
            .collect()
    }
}

fn collect_columns(node: &Bound, names: &[String], out: &mut Vec<String>) {
    match node {
        Bound::Column(index) => {
            let name = &names[*index];
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        Bound::Literal(_) => {}
        Bound::Not(inner) | Bound::Negate(inner) => collect_columns(inner, names, out),
        Bound::InList { expr, .. } => collect_columns(expr, names, out),
        Bound::Logical { left, right, .. }
        | Bound::Compare { left, right, .. }
        | Bound::Arithmetic { left, right, .. } => {
            collect_columns(left, names, out);
            collect_columns(right, names, out);
        }
    }
}

struct Binder<'a> {
    names: Vec<String>,
    types: &'a [ColumnType],
}

impl Binder<'_> {
    fn bind(&self, expr: &Expr) -> Result<(Bound, ValueType), ExpressionError> {
        match expr {
            Expr::Column(name) => {
                let index = self
                    .names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| ExpressionError::UnknownColumn {
                        column: name.clone(),
                        available: self.names.clone(),
                        suggestion: closest_match(name, &self.names),
                    })?;
                Ok((Bound::Column(index), ValueType::of_column(self.types[index])))
            }
            Expr::Literal(value) => Ok((Bound::Literal(value.clone()), ValueType::of_scalar(value))),
            Expr::Not(inner) => {
                let (inner, ty) = self.bind(inner)?;
                expect_boolean("not", ty)?;
                Ok((Bound::Not(Box::new(inner)), ValueType::Bool))
            }
            Expr::Negate(inner) => {
                let (inner, ty) = self.bind(inner)?;
                if !ty.is_numeric() && ty != ValueType::Null {
                    return Err(ExpressionError::type_mismatch(format!(
                        "cannot negate a {} value",
                        ty
                    )));
                }
                Ok((Bound::Negate(Box::new(inner)), ty))
            }
            Expr::Binary { op, left, right } => self.bind_binary(*op, left, right),
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let (bound, ty) = self.bind(expr)?;
                let list = list
                    .iter()
                    .map(|value| coerce_literal(value, ty, "in"))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((
                    Bound::InList {
                        expr: Box::new(bound),
                        list,
                        negated: *negated,
                    },
                    ValueType::Bool,
                ))
            }
        }
    }

    fn bind_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(Bound, ValueType), ExpressionError> {
        let (mut left_bound, left_ty) = self.bind(left)?;
        let (mut right_bound, right_ty) = self.bind(right)?;

        if op.is_logical() {
            expect_boolean(op.symbol(), left_ty)?;
            expect_boolean(op.symbol(), right_ty)?;
            return Ok((
                Bound::Logical {
                    and: op == BinaryOp::And,
                    left: Box::new(left_bound),
                    right: Box::new(right_bound),
                },
                ValueType::Bool,
            ));
        }

        if op.is_comparison() {
            // Text literals compared against timestamp columns are parsed once here
            if let Bound::Literal(value) = &right_bound {
                right_bound = Bound::Literal(coerce_literal(value, left_ty, op.symbol())?);
            } else if let Bound::Literal(value) = &left_bound {
                left_bound = Bound::Literal(coerce_literal(value, right_ty, op.symbol())?);
            } else if !left_ty.comparable(right_ty) {
                return Err(incomparable(op, left_ty, right_ty));
            }
            return Ok((
                Bound::Compare {
                    op,
                    left: Box::new(left_bound),
                    right: Box::new(right_bound),
                },
                ValueType::Bool,
            ));
        }

        let result_ty = match (left_ty, right_ty) {
            (ValueType::Null, other) | (other, ValueType::Null) if other.is_numeric() => {
                ValueType::Null
            }
            (ValueType::Null, ValueType::Null) => ValueType::Null,
            (ValueType::Int, ValueType::Int) if op != BinaryOp::Div => ValueType::Int,
            (l, r) if l.is_numeric() && r.is_numeric() => ValueType::Float,
            (l, r) => {
                return Err(ExpressionError::type_mismatch(format!(
                    "operator '{}' needs numeric operands, got {} and {}",
                    op.symbol(),
                    l,
                    r
                )))
            }
        };
        Ok((
            Bound::Arithmetic {
                op,
                left: Box::new(left_bound),
                right: Box::new(right_bound),
            },
            result_ty,
        ))
    }
}

fn expect_boolean(operator: &str, ty: ValueType) -> Result<(), ExpressionError> {
    if ty == ValueType::Bool || ty == ValueType::Null {
        Ok(())
    } else {
        Err(ExpressionError::type_mismatch(format!(
            "'{}' needs boolean operands, got {}",
            operator, ty
        )))
    }
}

fn incomparable(op: BinaryOp, left: ValueType, right: ValueType) -> ExpressionError {
    ExpressionError::type_mismatch(format!(
        "cannot compare {} with {} using '{}'",
        left,
        right,
        op.symbol()
    ))
}

/// Check a literal against the type it is compared with, parsing date strings
/// for timestamp operands
fn coerce_literal(value: &Scalar, target: ValueType, operator: &str) -> Result<Scalar, ExpressionError> {
    let literal_ty = ValueType::of_scalar(value);
    if target == ValueType::Timestamp {
        if let Scalar::Text(text) = value {
            return parse_timestamp(text).map(Scalar::Timestamp).ok_or_else(|| {
                ExpressionError::type_mismatch(format!(
                    "'{}' is not a valid date or timestamp",
                    text
                ))
            });
        }
    }
    if target.comparable(literal_ty) {
        Ok(value.clone())
    } else {
        Err(ExpressionError::type_mismatch(format!(
            "cannot compare {} with {} literal {} using '{}'",
            target,
            literal_ty,
            match value {
                Scalar::Text(text) => format!("'{}'", text),
                other => other.to_string(),
            },
            operator
        )))
    }
}

fn truthy(value: &Scalar) -> bool {
    matches!(value, Scalar::Bool(true))
}

fn eval(node: &Bound, table: &Table, row: usize) -> Scalar {
    match node {
        Bound::Column(index) => table.value(row, *index),
        Bound::Literal(value) => value.clone(),
        Bound::Not(inner) => Scalar::Bool(!truthy(&eval(inner, table, row))),
        Bound::Negate(inner) => match eval(inner, table, row) {
            Scalar::Int(v) => v.checked_neg().map(Scalar::Int).unwrap_or(Scalar::Null),
            Scalar::Float(v) => Scalar::Float(-v),
            _ => Scalar::Null,
        },
        Bound::Logical { and, left, right } => {
            let left = truthy(&eval(left, table, row));
            // Short-circuit
            let result = if *and {
                left && truthy(&eval(right, table, row))
            } else {
                left || truthy(&eval(right, table, row))
            };
            Scalar::Bool(result)
        }
        Bound::Compare { op, left, right } => {
            let left = eval(left, table, row);
            let right = eval(right, table, row);
            Scalar::Bool(compare(*op, &left, &right))
        }
        Bound::Arithmetic { op, left, right } => {
            arithmetic(*op, eval(left, table, row), eval(right, table, row))
        }
        Bound::InList {
            expr,
            list,
            negated,
        } => {
            let value = eval(expr, table, row);
            if value.is_null() {
                return Scalar::Bool(false);
            }
            let found = list
                .iter()
                .any(|item| value.partial_compare(item) == Some(Ordering::Equal));
            Scalar::Bool(found != *negated)
        }
    }
}

fn compare(op: BinaryOp, left: &Scalar, right: &Scalar) -> bool {
    let Some(ordering) = left.partial_compare(right) else {
        return false;
    };
    match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => false,
    }
}

fn arithmetic(op: BinaryOp, left: Scalar, right: Scalar) -> Scalar {
    match (left, right) {
        (Scalar::Int(a), Scalar::Int(b)) if op != BinaryOp::Div => {
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Mod => floor_mod_int(a, b),
                _ => None,
            };
            result.map(Scalar::Int).unwrap_or(Scalar::Null)
        }
        (left, right) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Scalar::Null;
            };
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b == 0.0 => return Scalar::Null,
                BinaryOp::Div => a / b,
                BinaryOp::Mod if b == 0.0 => return Scalar::Null,
                BinaryOp::Mod => floor_mod(a, b),
                _ => return Scalar::Null,
            };
            Scalar::Float(result)
        }
    }
}

/// Remainder taking the sign of the divisor; `None` on zero or overflow
fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && (r < 0) != (b < 0) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn floor_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

// Include tests
#[cfg(test)]
#[path = "eval_test.rs"]
mod eval_test;
