//! Query builder for the arXiv search API.
//!
//! A [`Query`] is an ordered list of top-level clauses joined with `AND`.
//! Values are checked once, when a [`Clause`] is built, so rendering never
//! touches them again.
//!
//! ```
//! use arxiv_fetch::models::Filter;
//! use arxiv_fetch::query::build_query;
//!
//! let filter = Filter::new(5)
//!     .author_expr("Alice Smith OR Bob Lee")
//!     .unwrap()
//!     .title("fortran");
//! let query = build_query(&filter).unwrap();
//! assert_eq!(
//!     query.to_string(),
//!     r#"(au:"Alice Smith" OR au:"Bob Lee") AND ti:"fortran""#
//! );
//! ```

pub mod expr;

use std::fmt;

use crate::models::Filter;
use crate::utils::collapse_whitespace;

/// Expression matching every record
pub const MATCH_ALL: &str = "all:*";

/// Errors raised while turning a filter into a query; no request is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("empty author name in author expression")]
    EmptyAuthorName,

    #[error("author expression mixes AND and OR: {0}")]
    MixedOperators(String),

    #[error("comma-separated authors need a leading AND or OR: {0}")]
    MissingOperator(String),

    #[error("author expression mixes a comma list with infix AND/OR: {0}")]
    MixedForms(String),

    #[error("{field} value contains a double quote: {value}")]
    EmbeddedQuote { field: Field, value: String },

    #[error("start year {from} is greater than end year {to}")]
    InvalidYearRange { from: i32, to: i32 },

    #[error("maximum result count must be a positive integer")]
    InvalidMaxCount,
}

/// Searchable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Title,
    All,
}

impl Field {
    /// Field prefix used in `search_query`
    pub fn prefix(&self) -> &'static str {
        match self {
            Field::Author => "au",
            Field::Title => "ti",
            Field::All => "all",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Author => "author",
            Field::Title => "title",
            Field::All => "all",
        };
        f.write_str(name)
    }
}

/// Boolean join operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }

    pub fn other(&self) -> Operator {
        match self {
            Operator::And => Operator::Or,
            Operator::Or => Operator::And,
        }
    }
}

/// One node of a query expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `prefix:"value"`
    Term { field: Field, value: String },
    /// Sub-clauses joined by one operator
    Group { op: Operator, clauses: Vec<Clause> },
}

impl Clause {
    /// Build a quoted term. Whitespace is collapsed; a double quote is rejected
    /// because phrases have no escape syntax.
    pub fn term(field: Field, value: &str) -> Result<Self, QueryError> {
        let value = collapse_whitespace(value);
        if value.contains('"') {
            return Err(QueryError::EmbeddedQuote { field, value });
        }
        Ok(Clause::Term { field, value })
    }

    /// Join clauses with `op`; a single clause is returned as is
    pub fn group(op: Operator, mut clauses: Vec<Clause>) -> Self {
        if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            Clause::Group { op, clauses }
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        match self {
            Clause::Term { field, value } => write!(f, "{}:\"{}\"", field.prefix(), value),
            Clause::Group { op, clauses } => {
                if parenthesize {
                    f.write_str("(")?;
                }
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.keyword())?;
                    }
                    clause.render(f, true)?;
                }
                if parenthesize {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false)
    }
}

/// Immutable search expression sent as `search_query`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// The empty query, rendered as [`MATCH_ALL`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level clause joined with `AND`
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str(MATCH_ALL);
        }
        let nested = self.clauses.len() > 1;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            clause.render(f, nested)?;
        }
        Ok(())
    }
}

/// Build the search expression for a filter.
///
/// The year range is not part of the query; it is applied during
/// normalization.
pub fn build_query(filter: &Filter) -> Result<Query, QueryError> {
    let mut query = Query::new();

    if let Some(author) = &filter.author {
        let terms = author
            .names()
            .iter()
            .map(|name| Clause::term(Field::Author, name))
            .collect::<Result<Vec<_>, _>>()?;
        query = query.and(Clause::group(author.operator(), terms));
    }

    if let Some(title) = &filter.title {
        query = query.and(Clause::term(Field::Title, title)?);
    }

    Ok(query)
}
