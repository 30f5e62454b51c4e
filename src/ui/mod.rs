//! CLI status output: colored status lines and a spinner.
//!
//! Everything here writes to stderr. Stdout carries only the listing, so it
//! stays parseable when piped.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

/// Check if stderr is a terminal.
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Kind of progress line, selects the icon and its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Skipped,
}

pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Skipped => "○",
    }
}

/// Icon and message, colored when `color` is set.
pub fn status_line(status: Status, msg: &str, color: bool) -> String {
    let icon = status_icon(status);
    if !color {
        return format!("{} {}", icon, msg);
    }
    let icon = match status {
        Status::Success => icon.green().bold().to_string(),
        Status::Error => icon.red().bold().to_string(),
        Status::Warning => icon.yellow().bold().to_string(),
        Status::Info => icon.cyan().to_string(),
        Status::Skipped => icon.dimmed().to_string(),
    };
    format!("{} {}", icon, msg)
}

pub fn print_status(status: Status, msg: &str) {
    eprintln!("{}", status_line(status, msg, stderr_is_terminal()));
}

/// Print a `━━━ title ━━━` header to stderr.
pub fn print_section(title: &str) {
    let header = format!("━━━ {} ━━━", title);
    if stderr_is_terminal() {
        eprintln!("{}", header.bold().cyan());
    } else {
        eprintln!("{}", header);
    }
}

/// Byte count in binary units, two decimals above one KB.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Spinner on stderr while a search runs; indicatif hides it when stderr
/// is not a terminal.
pub struct Spinner {
    bar: indicatif::ProgressBar,
}

impl Spinner {
    pub fn new(msg: &str) -> Self {
        let style = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
        let bar = indicatif::ProgressBar::new_spinner()
            .with_style(style)
            .with_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Remove the spinner line.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}
