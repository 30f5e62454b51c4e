//! Filesystem-safe file names derived from paper metadata.
//!
//! Names look like `richardson_the_state_of_fortran.pdf`: an optional author
//! surname, then the title, both lowercased with every run of characters
//! outside the allow-set collapsed to one underscore.

use std::collections::HashMap;

use crate::models::{Filter, Paper};

/// Extension of saved files
pub const PDF_EXTENSION: &str = "pdf";

/// Punctuation kept verbatim in names
pub const ALLOWED_PUNCTUATION: [char; 5] = ['-', '\'', '+', '(', ')'];

/// Longest stem (bytes, before the extension)
const MAX_STEM_LENGTH: usize = 200;

/// Which author, if any, leads the file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NameBase {
    /// Title-only names
    #[default]
    TitleOnly,
    /// Surname of the first paper author matching one of these names
    /// (lowercased), falling back to the paper's first author
    Author(Vec<String>),
}

impl NameBase {
    /// Author-filtered searches get surname-prefixed names
    pub fn from_filter(filter: &Filter) -> Self {
        match &filter.author {
            Some(author) => NameBase::Author(
                author
                    .names()
                    .iter()
                    .map(|name| name.to_lowercase())
                    .collect(),
            ),
            None => NameBase::TitleOnly,
        }
    }

    fn surname_for(&self, paper: &Paper) -> Option<String> {
        let NameBase::Author(names) = self else {
            return None;
        };
        let matched = paper.authors.iter().find(|author| {
            let author = author.to_lowercase();
            names.iter().any(|name| author.contains(name.as_str()))
        });
        matched
            .map(String::as_str)
            .or_else(|| paper.first_author())
            .and_then(|author| author.split_whitespace().last())
            .map(sanitize_component)
            .filter(|surname| !surname.is_empty())
    }
}

/// Lowercase `text` and collapse each run of disallowed characters into a
/// single underscore. The result never starts or ends with an underscore.
pub fn sanitize_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(&ch) {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Derive the file name for a paper.
///
/// ```
/// use arxiv_fetch::models::PaperBuilder;
/// use arxiv_fetch::utils::{derive_filename, NameBase};
///
/// let paper = PaperBuilder::new("2203.00001v1", "The State of Fortran", 2022)
///     .author("Brad Richardson")
///     .build();
/// assert_eq!(
///     derive_filename(&paper, &NameBase::TitleOnly),
///     "the_state_of_fortran.pdf"
/// );
/// ```
pub fn derive_filename(paper: &Paper, base: &NameBase) -> String {
    let mut title = sanitize_component(&paper.title);
    if title.is_empty() {
        title = placeholder(paper);
    }

    let stem = match base.surname_for(paper) {
        Some(surname) => format!("{}_{}", surname, title),
        None => title,
    };

    format!("{}.{}", truncate_stem(&stem), PDF_EXTENSION)
}

/// Stable stand-in for titles with no usable characters
fn placeholder(paper: &Paper) -> String {
    let id = if paper.paper_id.trim().is_empty() {
        paper
            .pdf_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    } else {
        paper.paper_id.as_str()
    };

    let id = sanitize_component(id);
    if id.is_empty() {
        "untitled".to_string()
    } else {
        format!("arxiv_{}", id)
    }
}

fn truncate_stem(stem: &str) -> &str {
    if stem.len() <= MAX_STEM_LENGTH {
        return stem;
    }
    let mut end = MAX_STEM_LENGTH;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    stem[..end].trim_end_matches('_')
}

/// Hands out names unique within one batch by appending `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashMap<String, usize>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: String) -> String {
        if !self.seen.contains_key(&name) {
            self.seen.insert(name.clone(), 1);
            return name;
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
            None => (name.clone(), String::new()),
        };

        let mut n = self.seen.get(&name).copied().unwrap_or(1);
        loop {
            n += 1;
            let candidate = format!("{}_{}{}", stem, n, ext);
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(name, n);
                self.seen.insert(candidate.clone(), 1);
                return candidate;
            }
        }
    }
}
