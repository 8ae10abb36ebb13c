//! Test reporter - live progress lines and the end-of-run summary

use crate::testing::runner::{FailureInfo, Location, Outcome, RunSummary, TestRecord};
use colored::*;
use crossterm::cursor::MoveToColumn;
use crossterm::{queue, terminal};
use std::fs;
use std::io::{self, Write};

/// Width used when the terminal size cannot be determined
pub const FALLBACK_WIDTH: u16 = 80;

/// Width of the `[NNN%]` progress marker
const PROGRESS_WIDTH: u16 = 6;

/// Output configuration for the reporter
#[derive(Debug, Clone, Default)]
pub struct ReporterOptions {
    /// Disable colored output
    pub no_color: bool,
    /// Fixed width instead of querying the terminal
    pub width: Option<u16>,
}

/// Writes one line per completed test, then a summary
pub struct Reporter<W: Write> {
    out: W,
    options: ReporterOptions,
    total: usize,
    completed: usize,
    any_failed: bool,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter for a run of `total` tests
    pub fn new(out: W, total: usize, options: ReporterOptions) -> Self {
        Self {
            out,
            options,
            total,
            completed: 0,
            any_failed: false,
        }
    }

    /// Consume the reporter, returning its writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Current terminal width, queried on every call
    fn width(&self) -> u16 {
        self.options
            .width
            .or_else(|| terminal::size().ok().map(|(cols, _)| cols))
            .filter(|cols| *cols > 0)
            .unwrap_or(FALLBACK_WIDTH)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.options.no_color {
            text.to_string()
        } else {
            text.color(color).to_string()
        }
    }

    fn bold(&self, text: &str, color: Option<Color>) -> String {
        if self.options.no_color {
            return text.to_string();
        }
        match color {
            Some(color) => text.color(color).bold().to_string(),
            None => text.bold().to_string(),
        }
    }

    /// Percentage of tests completed so far, rounded
    pub fn percent(&self) -> usize {
        progress_percent(self.completed, self.total)
    }

    /// Print the live line for a completed test and flush it
    pub fn test_completed(&mut self, record: &TestRecord) -> io::Result<()> {
        self.completed += 1;
        let status = match record.outcome {
            Outcome::Passed => self.paint("PASSED", Color::Green),
            Outcome::Failed(_) => {
                self.any_failed = true;
                self.paint("FAILED", Color::Red)
            }
        };

        let progress_color = if self.any_failed {
            Color::Red
        } else {
            Color::Green
        };
        let progress = self.paint(&format!("[{:>3}%]", self.percent()), progress_color);
        let column = self.width().saturating_sub(PROGRESS_WIDTH + 1);

        write!(self.out, "{} {}", record.identity, status)?;
        queue!(self.out, MoveToColumn(column))?;
        writeln!(self.out, "{}", progress)?;
        self.out.flush()
    }

    /// Print the failure list and the final counts line
    pub fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let width = usize::from(self.width());
        let failures: Vec<_> = summary.failures().collect();

        if !failures.is_empty() {
            let header = self.bold(&centered("short test summary info", '=', width), None);
            let label = self.paint("FAILED", Color::Red);
            writeln!(self.out, "{}", header)?;
            for (identity, info) in failures {
                writeln!(self.out, "{} {} - {}", label, identity, failure_detail(info))?;
            }
        }

        let seconds = summary.elapsed.as_secs_f64();
        let (text, color) = if summary.total() == 0 {
            (format!("no tests ran in {:.2}s", seconds), Color::Yellow)
        } else if summary.failed() > 0 {
            (
                format!(
                    "{} failed, {} passed in {:.2}s",
                    summary.failed(),
                    summary.passed(),
                    seconds
                ),
                Color::Red,
            )
        } else {
            (
                format!("{} passed in {:.2}s", summary.passed(), seconds),
                Color::Green,
            )
        };
        let footer = self.bold(&centered(&text, '=', width), Some(color));
        writeln!(self.out, "{}", footer)?;
        self.out.flush()
    }
}

/// `completed / total * 100` rounded half to even, 0 for an empty run
pub fn progress_percent(completed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round_ties_even() as usize
}

/// ` text ` centered in a line of `fill` characters `width` wide
fn centered(text: &str, fill: char, width: usize) -> String {
    let padded = format!(" {} ", text);
    let len = padded.chars().count();
    if len >= width {
        return padded;
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        padded,
        fill.to_string().repeat(right)
    )
}

/// The failing source line, or `Kind: message` when it cannot be read
fn failure_detail(info: &FailureInfo) -> String {
    info.location
        .as_ref()
        .and_then(read_source_line)
        .unwrap_or_else(|| info.describe())
}

/// Read the 1-based line `location.line` fresh from disk, trimmed
fn read_source_line(location: &Location) -> Option<String> {
    let index = usize::try_from(location.line).ok()?.checked_sub(1)?;
    let source = fs::read_to_string(&location.path).ok()?;
    let line = source.lines().nth(index)?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
