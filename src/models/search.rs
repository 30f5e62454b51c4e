//! Raw feed records, page requests and download results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::Paper;

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Value of the `sortOrder` request parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    #[default]
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    /// Value of the `sortBy` request parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

/// One link attached to a feed entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub title: Option<String>,
}

impl RawLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// The PDF representation link (`type="application/pdf"`)
    pub fn pdf(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: Some("related".to_string()),
            media_type: Some("application/pdf".to_string()),
            title: Some("pdf".to_string()),
        }
    }

    /// The abstract page link (`rel="alternate"`)
    pub fn alternate(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: Some("alternate".to_string()),
            media_type: Some("text/html".to_string()),
            title: None,
        }
    }

    pub fn is_pdf_typed(&self) -> bool {
        self.media_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("application/pdf"))
    }

    pub fn is_pdf_titled(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("pdf"))
    }

    pub fn is_alternate(&self) -> bool {
        self.rel.as_deref() == Some("alternate")
    }
}

/// One feed entry as delivered by the feed parser, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry id (the abstract page URL for arXiv)
    pub id: String,

    /// Title, possibly wrapped over several lines
    pub title: String,

    /// Author names in byline order
    pub authors: Vec<String>,

    pub published: Option<DateTime<Utc>>,

    pub updated: Option<DateTime<Utc>>,

    pub links: Vec<RawLink>,

    pub summary: Option<String>,

    pub categories: Vec<String>,
}

impl RawEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.authors.push(name.into());
        self
    }

    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    pub fn link(mut self, link: RawLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn category(mut self, term: impl Into<String>) -> Self {
        self.categories.push(term.into());
        self
    }
}

/// Window of one paged request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based offset into the result set
    pub start: usize,

    /// Entries requested (`max_results`)
    pub limit: usize,
}

impl PageRequest {
    pub fn new(start: usize, limit: usize) -> Self {
        Self { start, limit }
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "start={}, max_results={}", self.start, self.limit)
    }
}

/// Result of a download operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    pub paper_id: String,

    /// Path where the file was saved
    pub path: PathBuf,

    /// Number of bytes downloaded
    pub bytes: u64,
}

impl DownloadResult {
    pub fn new(paper_id: impl Into<String>, path: impl Into<PathBuf>, bytes: u64) -> Self {
        Self {
            paper_id: paper_id.into(),
            path: path.into(),
            bytes,
        }
    }
}

/// A failed download, with enough context to retry it by hand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFailure {
    pub paper_id: String,
    pub title: String,
    pub pdf_url: String,
    pub reason: String,
}

impl DownloadFailure {
    pub fn new(paper: &Paper, reason: impl fmt::Display) -> Self {
        Self {
            paper_id: paper.paper_id.clone(),
            title: paper.title.clone(),
            pdf_url: paper.pdf_url.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.paper_id, self.pdf_url, self.reason)
    }
}

/// Result of a batch download operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchDownloadResult {
    /// Successful downloads in batch order
    pub results: Vec<DownloadResult>,

    /// Failed downloads in batch order
    pub failures: Vec<DownloadFailure>,

    /// Ids of papers without a PDF link
    pub skipped: Vec<String>,

    /// Total bytes downloaded
    pub total_bytes: u64,
}

impl BatchDownloadResult {
    pub fn new(
        results: Vec<DownloadResult>,
        failures: Vec<DownloadFailure>,
        skipped: Vec<String>,
    ) -> Self {
        let total_bytes = results.iter().map(|r| r.bytes).sum();

        Self {
            results,
            failures,
            skipped,
            total_bytes,
        }
    }

    pub fn successful(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Papers considered for download, skipped ones included
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len() + self.skipped.len()
    }

    /// Check if all downloads succeeded (and there was at least one)
    pub fn is_all_success(&self) -> bool {
        !self.results.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for BatchDownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {} of {} paper(s), {} failed, {} skipped",
            self.successful(),
            self.total(),
            self.failed(),
            self.skipped.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_params() {
        assert_eq!(SortBy::default().as_str(), "lastUpdatedDate");
        assert_eq!(SortOrder::default().as_str(), "descending");
        assert_eq!(SortBy::SubmittedDate.as_str(), "submittedDate");
    }

    #[test]
    fn test_link_markers() {
        let pdf = RawLink::pdf("http://arxiv.org/pdf/1234.5678v1");
        assert!(pdf.is_pdf_typed());
        assert!(pdf.is_pdf_titled());
        assert!(!pdf.is_alternate());

        let page = RawLink::alternate("http://arxiv.org/abs/1234.5678v1");
        assert!(page.is_alternate());
        assert!(!page.is_pdf_typed());
    }

    #[test]
    fn test_batch_summary() {
        let paper = Paper::new("2", "Broken", 2020);
        let batch = BatchDownloadResult::new(
            vec![DownloadResult::new("1", "/tmp/a.pdf", 10)],
            vec![DownloadFailure::new(&paper, "HTTP 404")],
            vec!["3".to_string()],
        );

        assert_eq!(batch.total_bytes, 10);
        assert_eq!(batch.total(), 3);
        assert!(!batch.is_all_success());
        assert_eq!(
            batch.to_string(),
            "Downloaded 1 of 3 paper(s), 1 failed, 1 skipped"
        );
    }
}
