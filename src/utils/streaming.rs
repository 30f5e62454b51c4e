//! Paginated fetching of large result sets.
//!
//! [`Paginator::pages`] yields one [`Page`] per request, lazily: nothing is
//! sent until the stream is polled, and dropping the stream stops further
//! requests. Every request waits on the shared [`Pacer`] first.

use async_stream::stream;
use futures_util::stream::Stream;
use futures_util::{pin_mut, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{PageRequest, RawEntry};
use crate::query::Query;
use crate::sources::{Source, SourceError};
use crate::utils::Pacer;

/// A page request that failed; pages fetched before it stay valid
#[derive(Debug, thiserror::Error)]
#[error("request {request} (start={start}, max_results={limit}) failed: {source}")]
pub struct FetchError {
    /// 1-based ordinal of the failed request
    pub request: usize,
    pub start: usize,
    pub limit: usize,
    #[source]
    pub source: SourceError,
}

/// Entries returned by one request
#[derive(Debug, Clone)]
pub struct Page {
    pub request: PageRequest,
    pub entries: Vec<RawEntry>,
}

/// Everything a fetch produced, including a trailing failure
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Entries in feed order, at most the requested maximum
    pub entries: Vec<RawEntry>,
    /// Requests sent, the failed one included
    pub requests: usize,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Splits a bounded fetch into paced page requests
#[derive(Debug, Clone)]
pub struct Paginator {
    source: Arc<dyn Source>,
    pacer: Arc<Pacer>,
    page_size: usize,
}

impl Paginator {
    pub fn new(source: Arc<dyn Source>, pacer: Arc<Pacer>) -> Self {
        let page_size = source.page_size().max(1);
        Self {
            source,
            pacer,
            page_size,
        }
    }

    /// Override the source's page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Stream pages until `max_count` entries arrived, the source returned an
    /// empty page, or a request failed.
    ///
    /// Each request asks for `min(page_size, remaining)` entries starting at
    /// the number of entries received so far. A failure is yielded as the last
    /// item.
    pub fn pages(
        &self,
        query: Query,
        max_count: usize,
    ) -> impl Stream<Item = Result<Page, FetchError>> + Send + 'static {
        let source = Arc::clone(&self.source);
        let pacer = Arc::clone(&self.pacer);
        let page_size = self.page_size;

        stream! {
            let mut fetched = 0usize;
            let mut ordinal = 0usize;

            while fetched < max_count {
                let limit = page_size.min(max_count - fetched);
                let request = PageRequest::new(fetched, limit);
                ordinal += 1;

                pacer.wait().await;
                debug!(source = source.id(), %request, "Fetching page");

                match source.fetch_page(&query, request).await {
                    Ok(mut entries) => {
                        if entries.len() > limit {
                            warn!(
                                received = entries.len(),
                                limit,
                                "Source returned more entries than requested"
                            );
                            entries.truncate(limit);
                        }
                        let received = entries.len();
                        fetched += received;
                        info!(page = ordinal, received, total = fetched, "Received page");
                        yield Ok(Page { request, entries });
                        if received == 0 {
                            break;
                        }
                    }
                    Err(source_error) => {
                        yield Err(FetchError {
                            request: ordinal,
                            start: request.start,
                            limit: request.limit,
                            source: source_error,
                        });
                        break;
                    }
                }
            }
        }
    }

    /// Drain [`Paginator::pages`] into one outcome
    pub async fn fetch(&self, query: &Query, max_count: usize) -> FetchOutcome {
        let pages = self.pages(query.clone(), max_count);
        pin_mut!(pages);

        let mut outcome = FetchOutcome::default();
        while let Some(page) = pages.next().await {
            outcome.requests += 1;
            match page {
                Ok(page) => outcome.entries.extend(page.entries),
                Err(err) => {
                    warn!(error = %err, "Stopping pagination");
                    outcome.error = Some(err);
                }
            }
        }

        debug!(
            entries = outcome.entries.len(),
            requests = outcome.requests,
            "Fetch finished"
        );
        outcome
    }
}
