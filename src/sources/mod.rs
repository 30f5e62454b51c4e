//! Search providers.
//!
//! A [`Source`] answers exactly one paged request at a time. Pagination,
//! pacing and normalization live outside the source, so a provider only has
//! to know how to turn a [`Query`] and a [`PageRequest`] into raw entries.

mod arxiv;
pub mod mock;

pub use arxiv::{ArxivSource, ARXIV_API_URL};
pub use mock::MockSource;

use async_trait::async_trait;

use crate::models::{PageRequest, RawEntry};
use crate::query::Query;

/// Largest page the arXiv API is asked for in one request
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// The Source trait defines the interface for search providers.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "arxiv")
    fn id(&self) -> &str;

    /// Maximum entries returned by one request
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Fetch one page of results. An empty vector means the result set is
    /// exhausted.
    async fn fetch_page(&self, query: &Query, page: PageRequest)
        -> Result<Vec<RawEntry>, SourceError>;
}

/// Errors that can occur when requesting one page from a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Malformed feed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reported by the API inside the feed
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<feed_rs::parser::ParseFeedError> for SourceError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        SourceError::Parse(format!("Atom feed: {}", err))
    }
}
