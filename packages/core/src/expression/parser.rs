//! Pratt parser producing the expression tree

use crate::expression::lexer::{tokenize, Token, TokenKind};
use crate::expression::ExpressionError;
use crate::models::Scalar;

/// Maximum expression length, in characters
pub const MAX_EXPRESSION_LENGTH: usize = 4096;

/// Maximum nesting depth of the expression tree
pub const MAX_EXPRESSION_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Scalar>,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    LogicOr,
    LogicAnd,
    LogicNot,
    Comparison,
    Term,
    Factor,
    Prefix,
}

/// Parse an expression string into a tree
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    let length = input.chars().count();
    if length > MAX_EXPRESSION_LENGTH {
        return Err(ExpressionError::TooLong {
            length,
            max: MAX_EXPRESSION_LENGTH,
        });
    }
    if input.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(input)?,
        position: 0,
        depth: 0,
    };
    let expr = parser.parse_node(Precedence::None)?;
    if let Some(token) = parser.tokens.get(parser.position) {
        return Err(unexpected(token, "an operator or the end of the expression"));
    }
    Ok(expr)
}

fn unexpected(token: &Token, expected: &str) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        expected: expected.to_string(),
        found: token.kind.to_string(),
        position: token.position,
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self, expected: &str) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| ExpressionError::UnexpectedEnd {
                expected: expected.to_string(),
            })?;
        self.position += 1;
        Ok(token)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<(), ExpressionError> {
        let token = self.advance(expected)?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(&token, expected))
        }
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(ExpressionError::TooDeep {
                max: MAX_EXPRESSION_DEPTH,
            });
        }
        Ok(())
    }

    fn parse_node(&mut self, precedence: Precedence) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let mut left = self.parse_primary()?;

        while let Some(token) = self.current() {
            let next = self.infix_precedence(&token.kind);
            if precedence >= next {
                break;
            }
            left = self.parse_infix(left, next)?;
        }

        self.depth -= 1;
        Ok(left)
    }

    fn infix_precedence(&self, kind: &TokenKind) -> Precedence {
        match kind {
            TokenKind::Or | TokenKind::Pipe => Precedence::LogicOr,
            TokenKind::And | TokenKind::Ampersand => Precedence::LogicAnd,
            TokenKind::DoubleEqual
            | TokenKind::BangEqual
            | TokenKind::LeftAngle
            | TokenKind::LeftAngleEqual
            | TokenKind::RightAngle
            | TokenKind::RightAngleEqual
            | TokenKind::In => Precedence::Comparison,
            // `x not in [...]`
            TokenKind::Not
                if matches!(
                    self.tokens.get(self.position + 1).map(|t| &t.kind),
                    Some(TokenKind::In)
                ) =>
            {
                Precedence::Comparison
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            _ => Precedence::None,
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self.advance("a column, literal or '('")?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(Expr::Column(name)),
            TokenKind::Int(v) => Ok(Expr::Literal(Scalar::Int(v))),
            TokenKind::Float(v) => Ok(Expr::Literal(Scalar::Float(v))),
            TokenKind::Str(v) => Ok(Expr::Literal(Scalar::Text(v))),
            TokenKind::True => Ok(Expr::Literal(Scalar::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Scalar::Bool(false))),
            TokenKind::None => Ok(Expr::Literal(Scalar::Null)),
            TokenKind::Not | TokenKind::Tilde => {
                let operand = self.parse_node(Precedence::LogicNot)?;
                Ok(Expr::Not(Box::new(operand)))
            }
            TokenKind::Minus => {
                let operand = self.parse_node(Precedence::Prefix)?;
                Ok(match operand {
                    Expr::Literal(Scalar::Int(v)) => match v.checked_neg() {
                        Some(negated) => Expr::Literal(Scalar::Int(negated)),
                        None => Expr::Negate(Box::new(Expr::Literal(Scalar::Int(v)))),
                    },
                    Expr::Literal(Scalar::Float(v)) => Expr::Literal(Scalar::Float(-v)),
                    other => Expr::Negate(Box::new(other)),
                })
            }
            TokenKind::Plus => self.parse_node(Precedence::Prefix),
            TokenKind::OpenParen => {
                let inner = self.parse_node(Precedence::None)?;
                self.consume(TokenKind::CloseParen, "')'")?;
                Ok(inner)
            }
            _ => Err(unexpected(&token, "a column, literal or '('")),
        }
    }

    fn parse_infix(&mut self, left: Expr, precedence: Precedence) -> Result<Expr, ExpressionError> {
        let token = self.advance("an operator")?;
        let op = match token.kind {
            TokenKind::Or | TokenKind::Pipe => BinaryOp::Or,
            TokenKind::And | TokenKind::Ampersand => BinaryOp::And,
            TokenKind::DoubleEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::NotEq,
            TokenKind::LeftAngle => BinaryOp::Lt,
            TokenKind::LeftAngleEqual => BinaryOp::LtEq,
            TokenKind::RightAngle => BinaryOp::Gt,
            TokenKind::RightAngleEqual => BinaryOp::GtEq,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Asterisk => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::In => return self.parse_in_list(left, false),
            TokenKind::Not => {
                self.consume(TokenKind::In, "'in'")?;
                return self.parse_in_list(left, true);
            }
            _ => return Err(unexpected(&token, "an operator")),
        };

        // `x == [..]` and `x != [..]` are list membership tests
        if matches!(op, BinaryOp::Eq | BinaryOp::NotEq)
            && matches!(self.current().map(|t| &t.kind), Some(TokenKind::OpenBracket))
        {
            return self.parse_in_list(left, op == BinaryOp::NotEq);
        }

        let right = self.parse_node(precedence)?;
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_in_list(&mut self, left: Expr, negated: bool) -> Result<Expr, ExpressionError> {
        let open = self.advance("'['")?;
        let close = match open.kind {
            TokenKind::OpenBracket => TokenKind::CloseBracket,
            TokenKind::OpenParen => TokenKind::CloseParen,
            _ => return Err(unexpected(&open, "'[' starting a list of values")),
        };

        let mut list = Vec::new();
        loop {
            if self.current().map(|t| &t.kind) == Some(&close) {
                self.position += 1;
                break;
            }
            list.push(self.parse_list_literal()?);
            let token = self.advance("',' or the end of the list")?;
            if token.kind == close {
                break;
            }
            if token.kind != TokenKind::Comma {
                return Err(unexpected(&token, "',' or the end of the list"));
            }
        }

        Ok(Expr::InList {
            expr: Box::new(left),
            list,
            negated,
        })
    }

    fn parse_list_literal(&mut self) -> Result<Scalar, ExpressionError> {
        let token = self.advance("a literal value")?;
        let value = match token.kind {
            TokenKind::Int(v) => Scalar::Int(v),
            TokenKind::Float(v) => Scalar::Float(v),
            TokenKind::Str(v) => Scalar::Text(v),
            TokenKind::True => Scalar::Bool(true),
            TokenKind::False => Scalar::Bool(false),
            TokenKind::None => Scalar::Null,
            TokenKind::Minus => {
                let number = self.advance("a number")?;
                match number.kind {
                    TokenKind::Int(v) => Scalar::Int(-v),
                    TokenKind::Float(v) => Scalar::Float(-v),
                    _ => return Err(unexpected(&number, "a number")),
                }
            }
            _ => return Err(unexpected(&token, "a literal value")),
        };
        Ok(value)
    }
}
