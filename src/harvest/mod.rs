//! Search and download orchestration.
//!
//! A [`Harvester`] runs the whole pipeline for one invocation: validate the
//! filter, build the query, page through results, normalize, then optionally
//! download each paper's PDF. Page requests and downloads go through the same
//! [`Pacer`], one request at a time.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{
    BatchDownloadResult, DownloadFailure, DownloadResult, Filter, Paper,
};
use crate::query::{build_query, Query, QueryError};
use crate::sources::{ArxivSource, Source};
use crate::utils::{
    derive_filename, normalize, normalize_paper, DownloadError, FetchError, HttpClient, NameBase,
    Pacer, Paginator, PdfDownloader, UniqueNames,
};

/// Result of one search
#[derive(Debug)]
pub struct SearchOutcome {
    /// The query that was sent
    pub query: Query,
    /// Normalized papers in feed order
    pub papers: Vec<Paper>,
    /// Feed entries received before normalization and filtering
    pub entries_fetched: usize,
    /// Page requests issued
    pub requests: usize,
    /// Set when pagination stopped on a failed request; `papers` holds
    /// everything collected before it
    pub fetch_error: Option<FetchError>,
}

impl SearchOutcome {
    /// Zero matches without any failure. Informational, not an error.
    pub fn is_not_found(&self) -> bool {
        self.papers.is_empty() && self.fetch_error.is_none()
    }

    /// Pagination failed part way
    pub fn is_partial(&self) -> bool {
        self.fetch_error.is_some()
    }

    /// Papers that have a PDF link
    pub fn downloadable(&self) -> impl Iterator<Item = &Paper> {
        self.papers.iter().filter(|p| p.has_pdf())
    }
}

/// Progress of a download batch, reported per paper
#[derive(Debug)]
pub enum DownloadEvent<'a> {
    Started {
        index: usize,
        paper: &'a Paper,
        file_name: &'a str,
    },
    Finished {
        index: usize,
        paper: &'a Paper,
        result: &'a DownloadResult,
    },
    Failed {
        index: usize,
        paper: &'a Paper,
        error: &'a DownloadError,
    },
    Skipped {
        index: usize,
        paper: &'a Paper,
    },
}

/// Runs searches and download batches against one source
#[derive(Debug, Clone)]
pub struct Harvester {
    paginator: Paginator,
    downloader: PdfDownloader,
    pacer: Arc<Pacer>,
    verify_title: bool,
}

impl Harvester {
    pub fn new(source: Arc<dyn Source>, downloader: PdfDownloader, pacer: Arc<Pacer>) -> Self {
        Self {
            paginator: Paginator::new(source, Arc::clone(&pacer)),
            downloader,
            pacer,
            verify_title: true,
        }
    }

    /// Build the arXiv pipeline described by `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = HttpClient::with_timeout(config.api.timeout())?;
        let source = ArxivSource::new(client.clone())
            .with_base_url(config.api.base_url.clone())
            .with_sort(config.api.sort_by, config.api.sort_order)
            .with_page_size(config.api.page_size);
        let pacer = Arc::new(Pacer::new(config.api.request_interval()));

        Ok(Self::new(Arc::new(source), PdfDownloader::new(client), pacer)
            .with_verify_title(config.downloads.verify_title))
    }

    /// Drop papers whose title lacks the title keyword
    pub fn with_verify_title(mut self, verify_title: bool) -> Self {
        self.verify_title = verify_title;
        self
    }

    /// Search with `filter`.
    ///
    /// A [`QueryError`] is returned before any request is made. Fetch
    /// failures do not fail the call; they are reported in
    /// [`SearchOutcome::fetch_error`] next to the partial results.
    pub async fn search(&self, filter: &Filter) -> Result<SearchOutcome, QueryError> {
        filter.validate()?;
        let query = build_query(filter)?;
        info!(%query, max_results = filter.max_count, "Searching arXiv");
        if query.is_match_all() {
            warn!("No author or title criteria, matching every paper");
        }

        let fetched = self.paginator.fetch(&query, filter.max_count).await;
        let mut papers = normalize(&fetched.entries, &filter.years);
        self.retain_title_matches(&mut papers, filter);

        info!(
            entries = fetched.entries.len(),
            papers = papers.len(),
            requests = fetched.requests,
            complete = fetched.is_complete(),
            "Search finished"
        );

        Ok(SearchOutcome {
            query,
            entries_fetched: fetched.entries.len(),
            requests: fetched.requests,
            fetch_error: fetched.error,
            papers,
        })
    }

    /// Apply the local parts of `filter` to previously saved papers.
    pub fn refine(&self, papers: Vec<Paper>, filter: &Filter) -> Vec<Paper> {
        let mut papers: Vec<Paper> = papers
            .into_iter()
            .map(normalize_paper)
            .filter(|paper| filter.years.contains(paper.year))
            .collect();
        self.retain_title_matches(&mut papers, filter);
        papers
    }

    fn retain_title_matches(&self, papers: &mut Vec<Paper>, filter: &Filter) {
        let (true, Some(title)) = (self.verify_title, filter.title.as_deref()) else {
            return;
        };
        let needle = title.to_lowercase();
        papers.retain(|paper| {
            let keep = paper.title.to_lowercase().contains(&needle);
            if !keep {
                info!(paper_id = %paper.paper_id, title = %paper.title, "Title does not contain keyword, dropping");
            }
            keep
        });
    }

    /// Download every paper's PDF into `dir`. See
    /// [`Harvester::download_all_with_progress`].
    pub async fn download_all(
        &self,
        papers: &[Paper],
        dir: &Path,
        base: &NameBase,
    ) -> BatchDownloadResult {
        self.download_all_with_progress(papers, dir, base, |_| {})
            .await
    }

    /// Download sequentially, in order. Papers without a PDF link are
    /// skipped; a failed download is recorded and the batch continues.
    /// Names repeated within the batch get `_2`, `_3`, ... suffixes.
    pub async fn download_all_with_progress<F>(
        &self,
        papers: &[Paper],
        dir: &Path,
        base: &NameBase,
        mut on_event: F,
    ) -> BatchDownloadResult
    where
        F: FnMut(DownloadEvent<'_>),
    {
        let mut names = UniqueNames::new();
        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();

        for (i, paper) in papers.iter().enumerate() {
            let index = i + 1;
            if !paper.has_pdf() {
                info!(paper_id = %paper.paper_id, "No PDF link, skipping");
                skipped.push(paper.paper_id.clone());
                on_event(DownloadEvent::Skipped { index, paper });
                continue;
            }

            let file_name = names.claim(derive_filename(paper, base));
            on_event(DownloadEvent::Started {
                index,
                paper,
                file_name: &file_name,
            });

            self.pacer.wait().await;
            match self.downloader.download(paper, dir, &file_name).await {
                Ok(result) => {
                    info!(
                        paper_id = %paper.paper_id,
                        path = %result.path.display(),
                        bytes = result.bytes,
                        "Saved PDF"
                    );
                    on_event(DownloadEvent::Finished {
                        index,
                        paper,
                        result: &result,
                    });
                    results.push(result);
                }
                Err(error) => {
                    warn!(paper_id = %paper.paper_id, %error, "Download failed");
                    on_event(DownloadEvent::Failed {
                        index,
                        paper,
                        error: &error,
                    });
                    failures.push(DownloadFailure::new(paper, &error));
                }
            }
        }

        BatchDownloadResult::new(results, failures, skipped)
    }
}
