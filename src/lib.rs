//! # arxiv-fetch
//!
//! Search arXiv by author and title, list matching papers and download their
//! PDFs under deterministic, filesystem-safe names.
//!
//! ## Architecture
//!
//! - [`models`]: filters, raw feed entries, normalized papers, download records
//! - [`query`]: the search expression builder and the local filter language
//! - [`sources`]: the paged [`Source`] trait and the arXiv implementation
//! - [`utils`]: HTTP client and pacing, pagination, normalization, file names,
//!   downloads and listing output
//! - [`harvest`]: the search and download pipeline
//! - [`config`]: layered configuration
//! - [`ui`]: terminal status output for the CLI
//!
//! ```rust,no_run
//! use arxiv_fetch::config::Config;
//! use arxiv_fetch::harvest::Harvester;
//! use arxiv_fetch::models::Filter;
//! use arxiv_fetch::utils::NameBase;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let harvester = Harvester::from_config(&Config::default())?;
//! let filter = Filter::new(5).author_expr("Richardson")?.title("fortran");
//!
//! let outcome = harvester.search(&filter).await?;
//! let batch = harvester
//!     .download_all(&outcome.papers, "papers".as_ref(), &NameBase::from_filter(&filter))
//!     .await;
//! println!("{}", batch);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod harvest;
pub mod models;
pub mod query;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use harvest::{Harvester, SearchOutcome};
pub use models::{AuthorFilter, Filter, Paper, YearRange};
pub use query::{build_query, Query, QueryError};
pub use sources::{Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
