//! Terminal output helpers for the CLI.
//!
//! Results go to stdout; progress and per-source diagnostics go to stderr so
//! that JSON output stays pipeable.

use owo_colors::{OwoColorize, Stream};
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{AggregationReport, SourceType};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Shorten `text` to at most `max` characters, ending in "..." when cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Spinner shown on stderr while the sources are queried
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Start a spinner; nothing is drawn when stderr is not a terminal
    pub fn new(msg: &str) -> Self {
        let pb = if std::io::stderr().is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Remove the spinner line
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

/// One stderr line per searched source: paper count or failure diagnostic
pub fn print_source_status(report: &AggregationReport) {
    for id in &report.search_params.sources {
        let Some(result) = report.sources.get(id) else {
            continue;
        };
        let name = id
            .parse::<SourceType>()
            .map(|s| s.name())
            .unwrap_or(id.as_str());

        match &result.error {
            None => eprintln!(
                "{} {}: {} papers",
                "✓".if_supports_color(Stream::Stderr, |t| t.green()),
                name,
                result.count
            ),
            Some(error) => eprintln!(
                "{} {}: {}",
                "✗".if_supports_color(Stream::Stderr, |t| t.red()),
                name,
                error.if_supports_color(Stream::Stderr, |t| t.dimmed())
            ),
        }
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!(
        "{}",
        format!("━━━ {} ━━━", title).if_supports_color(Stream::Stdout, |t| t.bold())
    );
}
