//! Search filter supplied by the caller.
//!
//! A [`Filter`] is built once per invocation. The author part is parsed into an
//! explicit [`AuthorFilter`] variant up front, so nothing downstream has to
//! look for `AND`/`OR` inside free text.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::query::{Operator, QueryError};
use crate::utils::collapse_whitespace;

/// Author part of a search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    /// One author name
    Single(String),
    /// Any of the listed authors
    Disjunction(Vec<String>),
    /// All of the listed authors
    Conjunction(Vec<String>),
}

fn prefix_form() -> Option<&'static Regex> {
    static PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    PREFIX
        .get_or_init(|| Regex::new(r"(?is)^(AND|OR)(?:\s+(.*))?$").ok())
        .as_ref()
}

impl AuthorFilter {
    /// Parse an author expression.
    ///
    /// Accepted forms:
    /// - `""` (no author filter)
    /// - `"Brad Richardson"`
    /// - `"Alice Smith OR Bob Lee"` / `"Alice Smith AND Bob Lee"`
    /// - `"OR Alice Smith, Bob Lee"` / `"AND Alice Smith, Bob Lee"`
    ///
    /// The leading operator of the prefix form is case-insensitive; infix
    /// keywords must be uppercase. A bare `AND` or `OR` means no author filter.
    /// Commas and infix keywords cannot be combined in one expression.
    pub fn parse(expr: &str) -> Result<Option<Self>, QueryError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(None);
        }

        if let Some(caps) = prefix_form().and_then(|re| re.captures(expr)) {
            let op = if caps[1].eq_ignore_ascii_case("AND") {
                Operator::And
            } else {
                Operator::Or
            };
            let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if rest.is_empty() {
                return Ok(None);
            }
            if contains_keyword(rest, op.other()) {
                return Err(QueryError::MixedOperators(expr.to_string()));
            }
            if contains_keyword(rest, op) {
                return Err(QueryError::MixedForms(expr.to_string()));
            }
            let names = split_names(rest.split(','))?;
            return Ok(Some(Self::from_names(op, names)));
        }

        let words: Vec<&str> = expr.split_whitespace().collect();
        let has_and = words.contains(&Operator::And.keyword());
        let has_or = words.contains(&Operator::Or.keyword());

        match (has_and, has_or) {
            (true, true) => Err(QueryError::MixedOperators(expr.to_string())),
            (_, _) if expr.contains(',') && (has_and || has_or) => {
                Err(QueryError::MixedForms(expr.to_string()))
            }
            (false, false) => {
                if expr.contains(',') {
                    Err(QueryError::MissingOperator(expr.to_string()))
                } else {
                    Ok(Some(AuthorFilter::Single(collapse_whitespace(expr))))
                }
            }
            (and, _) => {
                let op = if and { Operator::And } else { Operator::Or };
                let groups = words
                    .split(|w| *w == op.keyword())
                    .map(|group| group.join(" "))
                    .collect::<Vec<_>>();
                let names = split_names(groups.iter().map(String::as_str))?;
                Ok(Some(Self::from_names(op, names)))
            }
        }
    }

    fn from_names(op: Operator, names: Vec<String>) -> Self {
        match op {
            Operator::And => AuthorFilter::Conjunction(names),
            Operator::Or => AuthorFilter::Disjunction(names),
        }
    }

    /// Author names in the order they were given
    pub fn names(&self) -> &[String] {
        match self {
            AuthorFilter::Single(name) => std::slice::from_ref(name),
            AuthorFilter::Disjunction(names) | AuthorFilter::Conjunction(names) => names,
        }
    }

    /// Operator joining the names
    pub fn operator(&self) -> Operator {
        match self {
            AuthorFilter::Conjunction(_) => Operator::And,
            AuthorFilter::Single(_) | AuthorFilter::Disjunction(_) => Operator::Or,
        }
    }
}

impl fmt::Display for AuthorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {} ", self.operator().keyword());
        write!(f, "{}", self.names().join(&separator))
    }
}

fn contains_keyword(text: &str, op: Operator) -> bool {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .any(|w| w == op.keyword())
}

fn split_names<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<String>, QueryError> {
    parts
        .map(|part| {
            let name = collapse_whitespace(part);
            if name.is_empty() {
                Err(QueryError::EmptyAuthorName)
            } else {
                Ok(name)
            }
        })
        .collect()
}

/// Inclusive publication year range; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    /// Create a range, rejecting `from > to`
    pub fn new(from: Option<i32>, to: Option<i32>) -> Result<Self, QueryError> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    /// A range that accepts every year
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(QueryError::InvalidYearRange { from, to }),
            _ => Ok(()),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether `year` falls inside the range, bounds included
    pub fn contains(&self, year: i32) -> bool {
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "None");
        }
        match self.from {
            Some(from) => write!(f, "{}", from)?,
            None => write!(f, "-∞")?,
        }
        match self.to {
            Some(to) => write!(f, " to {}", to),
            None => write!(f, " to ∞"),
        }
    }
}

/// Caller search criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Author restriction, `None` for any author
    pub author: Option<AuthorFilter>,

    /// Title keyword, `None` for any title
    pub title: Option<String>,

    /// Publication year range applied after fetching
    pub years: YearRange,

    /// Upper bound on the number of feed entries fetched
    pub max_count: usize,
}

impl Filter {
    /// A filter matching everything, bounded by `max_count`
    pub fn new(max_count: usize) -> Self {
        Self {
            author: None,
            title: None,
            years: YearRange::unbounded(),
            max_count,
        }
    }

    /// Set the author restriction
    pub fn author(mut self, author: AuthorFilter) -> Self {
        self.author = Some(author);
        self
    }

    /// Parse and set the author restriction from an expression
    pub fn author_expr(mut self, expr: &str) -> Result<Self, QueryError> {
        self.author = AuthorFilter::parse(expr)?;
        Ok(self)
    }

    /// Set the title keyword; blank text clears it
    pub fn title(mut self, title: impl AsRef<str>) -> Self {
        let title = collapse_whitespace(title.as_ref());
        self.title = (!title.is_empty()).then_some(title);
        self
    }

    /// Set the year range
    pub fn years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    /// Check the invariants that do not depend on query rendering
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.max_count == 0 {
            return Err(QueryError::InvalidMaxCount);
        }
        self.years.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_author() {
        assert_eq!(AuthorFilter::parse("").unwrap(), None);
        assert_eq!(AuthorFilter::parse("   ").unwrap(), None);
        assert_eq!(AuthorFilter::parse("OR").unwrap(), None);
        assert_eq!(AuthorFilter::parse("AND  ").unwrap(), None);
        assert_eq!(AuthorFilter::parse("or").unwrap(), None);
    }

    #[test]
    fn test_parse_single_author() {
        assert_eq!(
            AuthorFilter::parse("  Brad   Richardson ").unwrap(),
            Some(AuthorFilter::Single("Brad Richardson".to_string()))
        );
        // Names that merely start with a keyword stay single
        assert_eq!(
            AuthorFilter::parse("Oren Anderson").unwrap(),
            Some(AuthorFilter::Single("Oren Anderson".to_string()))
        );
    }

    #[test]
    fn test_parse_prefix_form() {
        assert_eq!(
            AuthorFilter::parse("OR Alice Smith, Bob Lee").unwrap(),
            Some(AuthorFilter::Disjunction(vec![
                "Alice Smith".to_string(),
                "Bob Lee".to_string()
            ]))
        );
        assert_eq!(
            AuthorFilter::parse("AND John Doe,Jim Smith").unwrap(),
            Some(AuthorFilter::Conjunction(vec![
                "John Doe".to_string(),
                "Jim Smith".to_string()
            ]))
        );
        // A leading "Or" is always the operator; repeat it to search for the name
        assert_eq!(
            AuthorFilter::parse("Or Levi").unwrap(),
            Some(AuthorFilter::Disjunction(vec!["Levi".to_string()]))
        );
        assert_eq!(
            AuthorFilter::parse("OR Or Levi").unwrap(),
            Some(AuthorFilter::Disjunction(vec!["Or Levi".to_string()]))
        );
        assert_eq!(
            AuthorFilter::parse("OR Alice,\nBob").unwrap(),
            Some(AuthorFilter::Disjunction(vec![
                "Alice".to_string(),
                "Bob".to_string()
            ]))
        );
        assert_eq!(
            AuthorFilter::parse("or Alice, Bob").unwrap(),
            Some(AuthorFilter::Disjunction(vec![
                "Alice".to_string(),
                "Bob".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_infix_form() {
        assert_eq!(
            AuthorFilter::parse("Alice Smith OR Bob Lee OR Carol King").unwrap(),
            Some(AuthorFilter::Disjunction(vec![
                "Alice Smith".to_string(),
                "Bob Lee".to_string(),
                "Carol King".to_string()
            ]))
        );
        assert_eq!(
            AuthorFilter::parse("Alice AND Bob").unwrap(),
            Some(AuthorFilter::Conjunction(vec![
                "Alice".to_string(),
                "Bob".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            AuthorFilter::parse("Alice OR Bob AND Carol"),
            Err(QueryError::MixedOperators(
                "Alice OR Bob AND Carol".to_string()
            ))
        );
        assert_eq!(
            AuthorFilter::parse("OR Alice, Bob AND Carol"),
            Err(QueryError::MixedOperators(
                "OR Alice, Bob AND Carol".to_string()
            ))
        );
        assert_eq!(
            AuthorFilter::parse("Alice OR"),
            Err(QueryError::EmptyAuthorName)
        );
        assert_eq!(
            AuthorFilter::parse("OR Alice,, Bob"),
            Err(QueryError::EmptyAuthorName)
        );
        assert_eq!(
            AuthorFilter::parse("Alice, Bob"),
            Err(QueryError::MissingOperator("Alice, Bob".to_string()))
        );
        assert_eq!(
            AuthorFilter::parse("OR Alice Smith OR Bob Lee"),
            Err(QueryError::MixedForms(
                "OR Alice Smith OR Bob Lee".to_string()
            ))
        );
        assert_eq!(
            AuthorFilter::parse("Alice, Bob OR Carol"),
            Err(QueryError::MixedForms("Alice, Bob OR Carol".to_string()))
        );
        assert_eq!(
            AuthorFilter::parse("Alice AND Bob, Carol"),
            Err(QueryError::MixedForms("Alice AND Bob, Carol".to_string()))
        );
    }

    #[test]
    fn test_author_filter_display() {
        let filter = AuthorFilter::parse("OR Alice, Bob").unwrap().unwrap();
        assert_eq!(filter.to_string(), "Alice OR Bob");
        assert_eq!(filter.names(), ["Alice".to_string(), "Bob".to_string()]);
    }

    #[test]
    fn test_year_range_contains() {
        let range = YearRange::new(Some(2018), Some(2020)).unwrap();
        assert!(range.contains(2018));
        assert!(range.contains(2019));
        assert!(range.contains(2020));
        assert!(!range.contains(2021));

        let open_end = YearRange::new(Some(2020), None).unwrap();
        assert!(open_end.contains(2030));
        assert!(!open_end.contains(2019));

        let open_start = YearRange::new(None, Some(2000)).unwrap();
        assert!(open_start.contains(1991));
        assert!(!open_start.contains(2001));

        assert!(YearRange::unbounded().contains(1850));
    }

    #[test]
    fn test_year_range_rejects_inverted_bounds() {
        assert_eq!(
            YearRange::new(Some(2021), Some(2020)),
            Err(QueryError::InvalidYearRange {
                from: 2021,
                to: 2020
            })
        );
    }

    #[test]
    fn test_year_range_display() {
        assert_eq!(YearRange::unbounded().to_string(), "None");
        assert_eq!(
            YearRange::new(Some(2019), None).unwrap().to_string(),
            "2019 to ∞"
        );
        assert_eq!(
            YearRange::new(None, Some(2020)).unwrap().to_string(),
            "-∞ to 2020"
        );
    }

    #[test]
    fn test_filter_builder() {
        let filter = Filter::new(5)
            .author_expr("Richardson")
            .unwrap()
            .title("  fortran ");

        assert_eq!(
            filter.author,
            Some(AuthorFilter::Single("Richardson".to_string()))
        );
        assert_eq!(filter.title.as_deref(), Some("fortran"));
        assert!(filter.validate().is_ok());
        assert!(Filter::new(5).title("   ").title.is_none());
    }

    #[test]
    fn test_filter_validate() {
        assert_eq!(Filter::new(0).validate(), Err(QueryError::InvalidMaxCount));

        let mut filter = Filter::new(3);
        filter.years = YearRange {
            from: Some(2022),
            to: Some(2021),
        };
        assert!(matches!(
            filter.validate(),
            Err(QueryError::InvalidYearRange { .. })
        ));
    }
}
