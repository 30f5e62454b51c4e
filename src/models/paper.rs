//! Paper model: the canonical record produced by normalization.

use serde::{Deserialize, Serialize};

/// A normalized arXiv paper
///
/// Titles and abstracts are single-line, whitespace-collapsed text. Author
/// order matches the byline of the feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// arXiv identifier including version (e.g. `2301.12345v1`)
    pub paper_id: String,

    /// Paper title
    pub title: String,

    /// Authors in byline order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year
    pub year: i32,

    /// Publication timestamp (RFC 3339)
    #[serde(default)]
    pub published: Option<String>,

    /// Versioned PDF link; empty when the entry has none
    #[serde(default)]
    pub pdf_url: String,

    /// Abstract page URL
    #[serde(default)]
    pub url: String,

    /// Abstract text
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Category terms, primary category first
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>, year: i32) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: title.into(),
            authors: Vec::new(),
            year,
            published: None,
            pdf_url: String::new(),
            url: String::new(),
            r#abstract: None,
            categories: Vec::new(),
        }
    }

    /// Check if paper has a downloadable PDF
    pub fn has_pdf(&self) -> bool {
        !self.pdf_url.is_empty()
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(paper_id: impl Into<String>, title: impl Into<String>, year: i32) -> Self {
        Self {
            paper: Paper::new(paper_id, title, year),
        }
    }

    /// Append one author
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.paper.authors.push(name.into());
        self
    }

    /// Replace the author list
    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = Some(abstract_text.into());
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.paper.pdf_url = url.into();
        self
    }

    /// Set abstract page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.paper.url = url.into();
        self
    }

    pub fn category(mut self, term: impl Into<String>) -> Self {
        self.paper.categories.push(term.into());
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}
