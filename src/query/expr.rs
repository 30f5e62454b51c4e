//! Local filter expressions over already normalized papers.
//!
//! The syntax mirrors the search API: `ti:`, `au:`, `year:` and `cat:` terms,
//! `AND`/`OR` and parentheses. Operators are applied strictly left to right,
//! so `a OR b AND c` means `(a OR b) AND c`.

use std::fmt;
use std::str::FromStr;

use super::Operator;
use crate::models::Paper;

/// Errors raised while parsing a filter expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("empty filter expression")]
    Empty,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unknown field '{0}' (expected ti, au, year or cat)")]
    UnknownField(String),

    #[error("missing value for '{0}:'")]
    MissingValue(String),

    #[error("unterminated quote in filter expression")]
    UnterminatedQuote,

    #[error("unbalanced parentheses in filter expression")]
    UnbalancedParens,

    #[error("invalid year '{0}'")]
    InvalidYear(String),

    #[error("expected a term after '{0}'")]
    DanglingOperator(String),
}

/// A single field test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring of the title
    Title(String),
    /// Case-insensitive equality with any author
    Author(String),
    /// Exact publication year
    Year(i32),
    /// Case-insensitive equality with any category
    Category(String),
}

impl Predicate {
    pub fn matches(&self, paper: &Paper) -> bool {
        match self {
            Predicate::Title(needle) => paper.title.to_lowercase().contains(needle.as_str()),
            Predicate::Author(name) => paper.authors.iter().any(|a| a.to_lowercase() == *name),
            Predicate::Year(year) => paper.year == *year,
            Predicate::Category(term) => paper.categories.iter().any(|c| c.to_lowercase() == *term),
        }
    }

    fn from_field(field: &str, value: &str) -> Result<Self, ExprError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ExprError::MissingValue(field.to_string()));
        }
        match field.to_lowercase().as_str() {
            "ti" => Ok(Predicate::Title(value.to_lowercase())),
            "au" => Ok(Predicate::Author(value.to_lowercase())),
            "cat" => Ok(Predicate::Category(value.to_lowercase())),
            "year" => value
                .parse()
                .map(Predicate::Year)
                .map_err(|_| ExprError::InvalidYear(value.to_string())),
            _ => Err(ExprError::UnknownField(field.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Op(Operator),
    Term(Predicate),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::Op(op) => f.write_str(op.keyword()),
            Token::Term(p) => write!(f, "{:?}", p),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if ch == '(' || ch == ')' {
            chars.next();
            tokens.push(if ch == '(' { Token::Open } else { Token::Close });
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == ':' {
                break;
            }
            word.push(c);
            chars.next();
        }

        if chars.peek() == Some(&':') {
            chars.next();
            let mut value = String::new();
            if chars.peek() == Some(&'"') {
                chars.next();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(ExprError::UnterminatedQuote);
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
            tokens.push(Token::Term(Predicate::from_field(&word, &value)?));
        } else {
            match word.to_uppercase().as_str() {
                "AND" => tokens.push(Token::Op(Operator::And)),
                "OR" => tokens.push(Token::Op(Operator::Or)),
                _ => return Err(ExprError::UnexpectedToken(word)),
            }
        }
    }

    Ok(tokens)
}

/// Parsed filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(Predicate),
    Binary {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.sequence(0)?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(Token::Close) => Err(ExprError::UnbalancedParens),
            Some(other) => Err(ExprError::UnexpectedToken(other.to_string())),
        }
    }

    pub fn matches(&self, paper: &Paper) -> bool {
        match self {
            Expr::Term(predicate) => predicate.matches(paper),
            Expr::Binary { op, lhs, rhs } => match op {
                Operator::And => lhs.matches(paper) && rhs.matches(paper),
                Operator::Or => lhs.matches(paper) || rhs.matches(paper),
            },
        }
    }

    /// Keep only the papers matching this expression, preserving order
    pub fn retain(&self, papers: &mut Vec<Paper>) {
        papers.retain(|paper| self.matches(paper));
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expr::parse(s)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn sequence(&mut self, depth: usize) -> Result<Expr, ExprError> {
        let mut lhs = self.operand(None)?;
        loop {
            match self.tokens.get(self.pos) {
                None => return Ok(lhs),
                Some(Token::Close) if depth > 0 => return Ok(lhs),
                Some(Token::Close) => return Err(ExprError::UnbalancedParens),
                Some(Token::Op(op)) => {
                    let op = *op;
                    self.pos += 1;
                    let rhs = self.operand(Some(op))?;
                    lhs = Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                }
                Some(other) => return Err(ExprError::UnexpectedToken(other.to_string())),
            }
        }
    }

    fn operand(&mut self, after: Option<Operator>) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::Term(predicate)) => Ok(Expr::Term(predicate)),
            Some(Token::Open) => {
                let inner = self.sequence(1)?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ExprError::UnbalancedParens),
                }
            }
            Some(other) => Err(ExprError::UnexpectedToken(other.to_string())),
            None => match after {
                Some(op) => Err(ExprError::DanglingOperator(op.keyword().to_string())),
                None => Err(ExprError::UnbalancedParens),
            },
        }
    }
}
