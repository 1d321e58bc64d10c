//! Tokenizer for filter expressions

use crate::expression::ExpressionError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    DoubleEqual,
    BangEqual,
    LeftAngle,
    LeftAngleEqual,
    RightAngle,
    RightAngleEqual,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Tilde,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Int(v) => write!(f, "{}", v),
            TokenKind::Float(v) => write!(f, "{}", v),
            TokenKind::Str(v) => write!(f, "'{}'", v),
            other => f.write_str(match other {
                TokenKind::True => "True",
                TokenKind::False => "False",
                TokenKind::None => "None",
                TokenKind::And => "and",
                TokenKind::Or => "or",
                TokenKind::Not => "not",
                TokenKind::In => "in",
                TokenKind::OpenParen => "(",
                TokenKind::CloseParen => ")",
                TokenKind::OpenBracket => "[",
                TokenKind::CloseBracket => "]",
                TokenKind::Comma => ",",
                TokenKind::DoubleEqual => "==",
                TokenKind::BangEqual => "!=",
                TokenKind::LeftAngle => "<",
                TokenKind::LeftAngleEqual => "<=",
                TokenKind::RightAngle => ">",
                TokenKind::RightAngleEqual => ">=",
                TokenKind::Plus => "+",
                TokenKind::Minus => "-",
                TokenKind::Asterisk => "*",
                TokenKind::Slash => "/",
                TokenKind::Percent => "%",
                TokenKind::Ampersand => "&",
                TokenKind::Pipe => "|",
                _ => "~",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Char offset of the first character
    pub position: usize,
}

/// Split an expression into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    Lexer::new(input).run()
}

struct Lexer {
    chars: Vec<char>,
    position: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.position += 1;
                continue;
            }
            let start = self.position;
            let kind = match c {
                '0'..='9' => self.number()?,
                '.' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                '\'' | '"' => self.string(c)?,
                '`' => self.quoted_identifier()?,
                c if c.is_alphabetic() || c == '_' => self.word(),
                _ => self.operator(c)?,
            };
            tokens.push(Token {
                kind,
                position: start,
            });
        }
        Ok(tokens)
    }

    fn operator(&mut self, c: char) -> Result<TokenKind, ExpressionError> {
        let start = self.position;
        self.position += 1;
        let two = |lexer: &mut Self, second: char, double: TokenKind, single: Option<TokenKind>| {
            if lexer.peek() == Some(second) {
                lexer.position += 1;
                Some(double)
            } else {
                single
            }
        };

        let kind = match c {
            '(' => Some(TokenKind::OpenParen),
            ')' => Some(TokenKind::CloseParen),
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            ',' => Some(TokenKind::Comma),
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Asterisk),
            '/' => Some(TokenKind::Slash),
            '%' => Some(TokenKind::Percent),
            '&' => Some(TokenKind::Ampersand),
            '|' => Some(TokenKind::Pipe),
            '~' => Some(TokenKind::Tilde),
            '=' => two(self, '=', TokenKind::DoubleEqual, None),
            '!' => two(self, '=', TokenKind::BangEqual, None),
            '<' => two(self, '=', TokenKind::LeftAngleEqual, Some(TokenKind::LeftAngle)),
            '>' => two(self, '=', TokenKind::RightAngleEqual, Some(TokenKind::RightAngle)),
            _ => None,
        };

        kind.ok_or_else(|| ExpressionError::UnexpectedCharacter {
            ch: c,
            position: start,
            hint: match c {
                '=' => " (use == for equality)".to_string(),
                '!' => " (use != or not)".to_string(),
                _ => String::new(),
            },
        })
    }

    fn number(&mut self) -> Result<TokenKind, ExpressionError> {
        let start = self.position;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => self.position += 1,
                '.' if !is_float => {
                    is_float = true;
                    self.position += 1;
                }
                'e' | 'E' => {
                    is_float = true;
                    self.position += 1;
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.position += 1;
                    }
                }
                _ => break,
            }
        }

        let text: String = self.chars[start..self.position].iter().collect();
        let digits = text.replace('_', "");
        let invalid = || ExpressionError::InvalidNumber {
            text: text.clone(),
            position: start,
        };

        if self.peek().is_some_and(|c| c.is_alphabetic()) {
            return Err(invalid());
        }
        if is_float {
            return digits.parse::<f64>().map(TokenKind::Float).map_err(|_| invalid());
        }
        match digits.parse::<i64>() {
            Ok(v) => Ok(TokenKind::Int(v)),
            // Too large for i64; fall back to float
            Err(_) => digits.parse::<f64>().map(TokenKind::Float).map_err(|_| invalid()),
        }
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ExpressionError> {
        let start = self.position;
        self.position += 1;
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ExpressionError::Unterminated {
                        what: "string",
                        position: start,
                    })
                }
                Some(c) if c == quote => return Ok(TokenKind::Str(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                    None => {
                        return Err(ExpressionError::Unterminated {
                            what: "string",
                            position: start,
                        })
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn quoted_identifier(&mut self) -> Result<TokenKind, ExpressionError> {
        let start = self.position;
        self.position += 1;
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(TokenKind::Identifier(name)),
                Some(c) => name.push(c),
                None => {
                    return Err(ExpressionError::Unterminated {
                        what: "backtick-quoted column name",
                        position: start,
                    })
                }
            }
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.position += 1;
        }
        let word: String = self.chars[start..self.position].iter().collect();
        match word.as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "True" | "true" => TokenKind::True,
            "False" | "false" => TokenKind::False,
            "None" | "null" => TokenKind::None,
            _ => TokenKind::Identifier(word),
        }
    }
}
