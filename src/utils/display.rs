//! Terminal display utilities for listing papers.
//!
//! Three renderers share one input: a plain aligned listing, a `comfy-table`
//! table, and pretty JSON. Wrapping and truncation measure display width with
//! `unicode-width`, so CJK titles and combining accents line up.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::sync::OnceLock;
use terminal_size::terminal_size;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::Paper;

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Column the plain listing wraps at
pub const WRAP_WIDTH: usize = 80;

/// Width of the label column, `": "` excluded
const LABEL_WIDTH: usize = 14;

/// Continuation indent, aligned with the first value character
const CONTINUATION_INDENT: usize = LABEL_WIDTH + 2;

/// Terminal information with cached size and capabilities.
#[derive(Debug, Clone)]
pub struct Terminal {
    width: usize,
    is_tty: bool,
}

static TERMINAL_INFO: OnceLock<Terminal> = OnceLock::new();

/// Get the global terminal information, initialized on first call.
pub fn terminal_info() -> &'static Terminal {
    TERMINAL_INFO.get_or_init(|| Terminal {
        width: terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(DEFAULT_WIDTH),
        is_tty: io::stdout().is_terminal(),
    })
}

#[inline]
pub fn terminal_width() -> usize {
    terminal_info().width
}

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    terminal_info().is_tty
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Truncate text to fit within `max_width` columns, appending an ellipsis if
/// anything was cut.
///
/// ```
/// use arxiv_fetch::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        truncated.push(c);
    }

    format!("{}...", truncated.trim_end())
}

/// Greedy word wrap. The first line starts with `initial`, later lines with
/// `subsequent`; no line exceeds `width` columns unless an indent alone does.
/// Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize, initial: &str, subsequent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = initial.to_string();
    let mut line_width = UnicodeWidthStr::width(initial);
    let mut line_has_word = false;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let gap = usize::from(line_has_word);

        if line_has_word && line_width + gap + word_width > width {
            lines.push(std::mem::take(&mut line));
            line.push_str(subsequent);
            line_width = UnicodeWidthStr::width(subsequent);
            line_has_word = false;
        }

        if !line_has_word && line_width + word_width > width {
            // Split an overlong word across as many lines as it needs
            for c in word.chars() {
                let w = char_width(c);
                if line_has_word && line_width + w > width {
                    lines.push(std::mem::take(&mut line));
                    line.push_str(subsequent);
                    line_width = UnicodeWidthStr::width(subsequent);
                }
                line.push(c);
                line_width += w;
                line_has_word = true;
            }
            continue;
        }

        if line_has_word {
            line.push(' ');
            line_width += 1;
        }
        line.push_str(word);
        line_width += word_width;
        line_has_word = true;
    }

    if line_has_word || lines.is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

/// Capitalize every space, hyphen and apostrophe separated part of a name.
///
/// ```
/// use arxiv_fetch::utils::capitalize_name;
///
/// assert_eq!(capitalize_name("jean-luc o'neil"), "Jean-Luc O'Neil");
/// ```
pub fn capitalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_start = true;
    for c in name.chars() {
        if matches!(c, ' ' | '-' | '\'') {
            out.push(c);
            at_start = true;
        } else if at_start {
            out.extend(c.to_uppercase());
            at_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Capitalized authors joined with `", "`
pub fn format_authors(authors: &[String]) -> String {
    authors
        .iter()
        .map(|a| capitalize_name(a.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `label` padded to the label column, followed by `": "`
fn label(text: &str) -> String {
    format!("{:<width$}: ", text, width = LABEL_WIDTH)
}

fn field_line(name: &str, value: &str) -> String {
    wrap_text(
        value,
        WRAP_WIDTH,
        &label(&format!("    {}", name)),
        &" ".repeat(CONTINUATION_INDENT),
    )
}

/// Render the aligned plain-text listing, one block per paper.
pub fn render_listing(papers: &[Paper], include_abstract: bool) -> String {
    let continuation = " ".repeat(CONTINUATION_INDENT);
    let mut out = String::new();

    for (i, paper) in papers.iter().enumerate() {
        let prefix = label(&format!("[{}]  Title", i + 1));
        out.push_str(&wrap_text(&paper.title, WRAP_WIDTH, &prefix, &continuation));
        out.push('\n');
        out.push_str(&format!("{}{}\n", label("    Authors"), format_authors(&paper.authors)));
        out.push_str(&format!("{}{}\n", label("    Year"), paper.year));

        let pdf = if paper.has_pdf() {
            paper.pdf_url.as_str()
        } else {
            "none"
        };
        out.push_str(&format!("{}{}\n", label("    PDF Link"), pdf));

        if include_abstract {
            let text = paper.r#abstract.as_deref().unwrap_or("");
            out.push_str(&field_line("Abstract", text));
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

/// Header printed before each download in the CLI.
pub fn render_download_header(index: usize, paper: &Paper) -> String {
    format!(
        "[{}] Downloading: {}\n{}{}\n{}{}\n    from: {}",
        index,
        paper.title,
        label("    Authors"),
        format_authors(&paper.authors),
        label("    Year"),
        paper.year,
        paper.pdf_url
    )
}

/// Render papers as a table sized to the terminal.
pub fn render_table(papers: &[Paper], width: usize) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(u16::try_from(width).unwrap_or(u16::MAX))
        .set_header(vec!["#", "Title", "Authors", "Year", "PDF"]);

    for (i, paper) in papers.iter().enumerate() {
        let pdf = if paper.has_pdf() {
            paper.paper_id.as_str()
        } else {
            "-"
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&paper.title).add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&format_authors(&paper.authors), 40)),
            Cell::new(paper.year),
            Cell::new(pdf),
        ]);
    }

    table.to_string()
}

/// Pretty JSON array of papers
pub fn render_json(papers: &[Paper]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperBuilder;

    fn fortran_paper() -> Paper {
        PaperBuilder::new("2203.00001v1", "The State of Fortran", 2022)
            .authors(["brad richardson", "milan curcic"])
            .pdf_url("http://arxiv.org/pdf/2203.00001v1")
            .abstract_text("A survey of the Fortran ecosystem.")
            .build()
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 0), "");
        assert_eq!(truncate_with_ellipsis("Hello", 1), "...");
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "word ".repeat(40);
        let wrapped = wrap_text(&text, 30, "Title: ", "       ");
        for line in wrapped.lines() {
            assert!(line.len() <= 30, "{line:?}");
        }
        assert!(wrapped.starts_with("Title: word"));
        assert!(wrapped.lines().skip(1).all(|l| l.starts_with("       word")));
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let wrapped = wrap_text(&"x".repeat(25), 10, "", "");
        assert_eq!(wrapped, "xxxxxxxxxx\nxxxxxxxxxx\nxxxxx");
    }

    #[test]
    fn test_wrap_text_empty() {
        assert_eq!(wrap_text("", 80, "Abstract  : ", ""), "Abstract  :");
    }

    #[test]
    fn test_capitalize_name() {
        assert_eq!(capitalize_name("brad richardson"), "Brad Richardson");
        assert_eq!(capitalize_name("JEAN-LUC PICARD"), "Jean-Luc Picard");
        assert_eq!(capitalize_name("o'brien"), "O'Brien");
        assert_eq!(capitalize_name("ondřej čertík"), "Ondřej Čertík");
    }

    #[test]
    fn test_render_listing_layout() {
        let listing = render_listing(&[fortran_paper()], false);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "[1]  Title    : The State of Fortran");
        assert_eq!(lines[1], "    Authors   : Brad Richardson, Milan Curcic");
        assert_eq!(lines[2], "    Year      : 2022");
        assert_eq!(lines[3], "    PDF Link  : http://arxiv.org/pdf/2203.00001v1");
        assert_eq!(lines[4], "");
        assert!(!listing.contains("Abstract"));
    }

    #[test]
    fn test_render_listing_wraps_long_title() {
        let paper = PaperBuilder::new("1", "long title words ".repeat(10), 2020).build();
        let listing = render_listing(&[paper], true);
        let lines: Vec<&str> = listing.lines().collect();
        assert!(lines[0].len() <= WRAP_WIDTH);
        assert!(lines[1].starts_with(&" ".repeat(16)));
        assert!(listing.contains("    PDF Link  : none"));
        assert!(listing.contains("    Abstract  :"));
    }

    #[test]
    fn test_render_download_header() {
        let header = render_download_header(2, &fortran_paper());
        assert!(header.starts_with("[2] Downloading: The State of Fortran\n"));
        assert!(header.contains("    Authors   : Brad Richardson, Milan Curcic"));
        assert!(header.ends_with("    from: http://arxiv.org/pdf/2203.00001v1"));
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[fortran_paper()], 120);
        assert!(table.contains("Title"));
        assert!(table.contains("The State of Fortran"));
        assert!(table.contains("2203.00001v1"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&[fortran_paper()]).unwrap();
        let parsed: Vec<Paper> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![fortran_paper()]);
    }
}
