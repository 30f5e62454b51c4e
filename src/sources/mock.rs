//! Mock source for testing purposes.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Mutex;

use crate::models::{PageRequest, RawEntry, RawLink};
use crate::query::Query;
use crate::sources::{Source, SourceError, DEFAULT_PAGE_SIZE};

/// An in-memory source serving a fixed result set and recording every request.
#[derive(Debug)]
pub struct MockSource {
    entries: Vec<RawEntry>,
    page_size: usize,
    fail_at: Option<usize>,
    requests: Mutex<Vec<PageRequest>>,
    queries: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source serving `entries` in order.
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self {
            entries,
            page_size: DEFAULT_PAGE_SIZE,
            fail_at: None,
            requests: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Serve `count` generated entries
    pub fn with_generated(count: usize) -> Self {
        Self::new((0..count).map(|i| make_entry(i, 2020)).collect())
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fail the request whose start offset is `start`
    pub fn failing_at(mut self, start: usize) -> Self {
        self.fail_at = Some(start);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Rendered queries received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(
        &self,
        query: &Query,
        page: PageRequest,
    ) -> Result<Vec<RawEntry>, SourceError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(page);
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());

        if self.fail_at == Some(page.start) {
            return Err(SourceError::Network("simulated failure".to_string()));
        }

        let start = page.start.min(self.entries.len());
        let end = page.start.saturating_add(page.limit).min(self.entries.len());
        Ok(self.entries[start..end].to_vec())
    }
}

/// Helper function to create a raw entry for testing.
pub fn make_entry(n: usize, year: i32) -> RawEntry {
    let id = format!("2001.{:05}v1", n);
    RawEntry::new(format!("http://arxiv.org/abs/{}", id), format!("Paper {}", n))
        .author(format!("Author {}", n))
        .published(
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
        .link(RawLink::alternate(format!("http://arxiv.org/abs/{}", id)))
        .link(RawLink::pdf(format!("http://arxiv.org/pdf/{}", id)))
}
