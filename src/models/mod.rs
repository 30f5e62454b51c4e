//! Core data models for filters, feed entries and papers.

mod filter;
mod paper;
mod search;

pub use filter::{AuthorFilter, Filter, YearRange};
pub use paper::{Paper, PaperBuilder};
pub use search::{
    BatchDownloadResult, DownloadFailure, DownloadResult, PageRequest, RawEntry, RawLink, SortBy,
    SortOrder,
};
