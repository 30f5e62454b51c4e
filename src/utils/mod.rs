//! Utility modules supporting search and download.
//!
//! - [`HttpClient`] and [`Pacer`]: shared transport and request spacing
//! - [`Paginator`]: bounded, paced page fetching with partial results
//! - [`normalize`]: raw feed entries into [`Paper`](crate::models::Paper) records
//! - [`derive_filename`]: filesystem-safe PDF names
//! - [`PdfDownloader`]: streaming PDF downloads
//! - [`render_listing`], [`render_table`], [`render_json`]: listing output
//!
//! # Pagination
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use arxiv_fetch::query::Query;
//! use arxiv_fetch::sources::ArxivSource;
//! use arxiv_fetch::utils::{HttpClient, Pacer, Paginator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(ArxivSource::new(HttpClient::new()?));
//! let paginator = Paginator::new(source, Arc::new(Pacer::default()));
//! let outcome = paginator.fetch(&Query::new(), 250).await;
//! println!("{} entries in {} requests", outcome.entries.len(), outcome.requests);
//! # Ok(())
//! # }
//! ```

mod display;
mod download;
mod filename;
mod http;
mod normalize;
mod streaming;

pub use display::{
    capitalize_name, format_authors, is_terminal, render_download_header, render_json,
    render_listing, render_table, terminal_width, truncate_with_ellipsis, wrap_text, WRAP_WIDTH,
};
pub use download::{validate_pdf_url, DownloadError, PdfDownloader};
pub use filename::{derive_filename, sanitize_component, NameBase, UniqueNames, PDF_EXTENSION};
pub use http::{HttpClient, Pacer, DEFAULT_REQUEST_INTERVAL, DEFAULT_TIMEOUT};
pub use normalize::{
    collapse_whitespace, normalize, normalize_entry, normalize_paper, paper_id_from_entry_id,
    select_pdf_link,
};
pub use streaming::{FetchError, FetchOutcome, Page, Paginator};
