//! Record normalization: raw feed entries into [`Paper`] records.
//!
//! Everything here is pure. Entries whose year cannot be determined are
//! dropped with a warning; everything else becomes a Paper, with or without a
//! PDF link.

use chrono::Datelike;
use tracing::warn;

use crate::models::{Paper, RawEntry, RawLink, YearRange};

/// Collapse runs of whitespace (including newlines) into single spaces and trim.
///
/// ```
/// use arxiv_fetch::utils::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Deep\n    Learning  "), "Deep Learning");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize feed entries and apply the year range, preserving feed order.
pub fn normalize(entries: &[RawEntry], years: &YearRange) -> Vec<Paper> {
    entries
        .iter()
        .filter_map(normalize_entry)
        .filter(|paper| years.contains(paper.year))
        .collect()
}

/// Normalize one entry. Returns `None` when the entry carries no timestamp.
pub fn normalize_entry(entry: &RawEntry) -> Option<Paper> {
    let Some(timestamp) = entry.published.or(entry.updated) else {
        warn!(id = %entry.id, "Skipping entry without a publication date");
        return None;
    };

    let url = entry
        .links
        .iter()
        .find(|link| link.is_alternate())
        .map(|link| link.href.clone())
        .unwrap_or_else(|| entry.id.clone());

    let paper = Paper {
        paper_id: paper_id_from_entry_id(&entry.id),
        title: entry.title.clone(),
        authors: entry.authors.clone(),
        year: timestamp.year(),
        published: Some(timestamp.to_rfc3339()),
        pdf_url: select_pdf_link(&entry.links)
            .map(|link| link.href.clone())
            .unwrap_or_default(),
        url,
        r#abstract: entry.summary.clone(),
        categories: entry.categories.clone(),
    };

    Some(normalize_paper(paper))
}

/// Apply field normalization to a Paper. Idempotent.
pub fn normalize_paper(mut paper: Paper) -> Paper {
    paper.title = collapse_whitespace(&paper.title);
    paper.authors = paper
        .authors
        .iter()
        .map(|name| collapse_whitespace(name))
        .collect();
    paper.r#abstract = paper
        .r#abstract
        .as_deref()
        .map(collapse_whitespace)
        .filter(|text| !text.is_empty());
    paper.pdf_url = paper.pdf_url.trim().to_string();
    paper
}

/// First PDF-typed link, else the first link titled `pdf`
pub fn select_pdf_link(links: &[RawLink]) -> Option<&RawLink> {
    links
        .iter()
        .find(|link| link.is_pdf_typed())
        .or_else(|| links.iter().find(|link| link.is_pdf_titled()))
}

/// Extract the arXiv identifier from an entry id such as
/// `http://arxiv.org/abs/2301.12345v1` or `http://arxiv.org/abs/math/0104020v1`.
pub fn paper_id_from_entry_id(id: &str) -> String {
    match id.find("/abs/") {
        Some(pos) => id[pos + "/abs/".len()..].to_string(),
        None => id.trim().to_string(),
    }
}
