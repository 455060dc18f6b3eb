//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with specialized
//! rendering for run summaries and benchmark reports, and progress
//! indicators for long runs.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use is_terminal::IsTerminal;
use jscompare_core::report::conformance::{format_elapsed, percentage};
use jscompare_core::{
    BenchmarkReport, ConformanceResult, Implementation, Regression, RunObserver, RunSummary,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for run results
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a conformance run summary
    fn format_summary(&self, summary: &RunSummary) -> Result<String>;

    /// Format a benchmark report
    fn format_benchmark_report(&self, report: &BenchmarkReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_summary_human(summary)),
            _ => self.format(summary),
        }
    }

    fn format_benchmark_report(&self, report: &BenchmarkReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_benchmark_human(report)),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write + Send>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stderr().is_terminal(),
            quiet,
            verbose,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            verbose,
            writer,
        }
    }

    /// Turn progress indicators off regardless of the terminal
    pub fn disable_progress(&mut self) {
        self.show_progress = false;
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Check if progress indicators should be shown
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        trace!("Outputting data");
        let formatted = self.format.format(value)?;

        if self.is_human() {
            self.writeln(&formatted)
        } else {
            self.write(&formatted)
        }
    }

    /// Write a conformance run summary
    pub fn summary(&mut self, summary: &RunSummary) -> Result<()> {
        let formatted = self.format.format_summary(summary)?;
        self.writeln(&formatted)
    }

    /// Write a benchmark report
    pub fn benchmark_report(&mut self, report: &BenchmarkReport) -> Result<()> {
        let formatted = self.format.format_benchmark_report(report)?;
        self.writeln(&formatted)
    }

    /// Describe regressions against a baseline
    pub fn regressions(&mut self, regressions: &[Regression]) -> Result<()> {
        for r in regressions {
            self.error(&format!(
                "✗ {} {}: fail {} → {}, error {} → {}",
                r.implementation,
                r.draft.display_name(),
                r.baseline.fail,
                r.current.fail,
                r.baseline.error,
                r.current.error
            ))?;
        }
        Ok(())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Per-implementation progress bars for a conformance run
    pub fn progress_observer(&self) -> Option<ProgressObserver> {
        self.show_progress.then(ProgressObserver::new)
    }

    /// Write detail that only `-v` and above should see
    pub fn debug(&mut self, message: &str) -> Result<()> {
        if self.verbose == 0 || self.quiet || !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "DEBUG:".dimmed(), message.dimmed()))
        } else {
            self.writeln(&format!("DEBUG: {}", message))
        }
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || !self.is_human() {
            return Ok(());
        }

        let rendered = render_table(headers, &rows);
        let mut lines = rendered.lines();
        if let Some(header) = lines.next() {
            if self.use_color {
                self.writeln(&header.bold().to_string())?;
            } else {
                self.writeln(header)?;
            }
        }
        for line in lines {
            self.writeln(line)?;
        }
        Ok(())
    }
}

/// Progress bars, one per implementation, driven by runner callbacks
pub struct ProgressObserver {
    multi: MultiProgress,
    bars: Mutex<BTreeMap<Implementation, ProgressBar>>,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    pub fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(BTreeMap::new()),
        }
    }

    /// Cases counted so far for an implementation still running
    pub fn position(&self, implementation: Implementation) -> Option<u64> {
        let bars = self.bars.lock().ok()?;
        bars.get(&implementation).map(ProgressBar::position)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ProgressObserver {
    fn implementation_started(&self, implementation: Implementation, cases: usize) {
        let bar = self.multi.add(ProgressBar::new(cases as u64));
        bar.set_style(default_progress_style());
        bar.set_prefix(implementation.short_name());
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(implementation, bar);
        }
    }

    fn case_finished(&self, result: &ConformanceResult) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(&result.implementation) {
                bar.inc(1);
            }
        }
    }

    fn implementation_finished(&self, implementation: Implementation) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(&implementation) {
                bar.finish_with_message("done");
            }
        }
    }
}

/// Helper function to create a progress bar style
pub fn default_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:>16.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Render rows under headers with box-drawing separators
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_row = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" │ ");
    out.push_str(header_row.trim_end());
    out.push('\n');

    let separator = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    out.push_str(&separator);
    out.push('\n');

    for row in rows {
        let row_str = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join(" │ ");
        out.push_str(row_str.trim_end());
        out.push('\n');
    }
    out
}

/// One line per implementation: overall counts and pass rate
fn format_summary_human(summary: &RunSummary) -> String {
    let matrix = &summary.results;
    let rows: Vec<Vec<String>> = matrix
        .implementations()
        .map(|imp| {
            let counts = matrix.overall(imp).overall();
            vec![
                imp.short_name().to_string(),
                counts.pass.to_string(),
                counts.fail.to_string(),
                counts.skipped.to_string(),
                counts.error.to_string(),
                format!("{}%", percentage(counts.pass, counts.applicable())),
            ]
        })
        .collect();

    let mut out = String::from("═══ Conformance Summary ═══\n\n");
    out.push_str(&render_table(
        &["Implementation", "Pass", "Fail", "Skip", "Error", "Pass rate"],
        &rows,
    ));
    out.push('\n');
    out.push_str(&format_elapsed(summary.duration));
    out
}

fn format_ops(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "-".to_string())
}

/// One line per record; failed records show their message
fn format_benchmark_human(report: &BenchmarkReport) -> String {
    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .map(|r| {
            vec![
                r.implementation.short_name().to_string(),
                r.fixture.clone(),
                r.operation.to_string(),
                if r.is_ok() {
                    format!("{} ± {}", format_ops(r.ops_per_sec), format_ops(r.ops_error))
                } else {
                    format!("failed: {}", r.message.as_deref().unwrap_or(""))
                },
            ]
        })
        .collect();

    let mut out = format!("═══ Benchmark {} ({}) ═══\n\n", report.name, report.mode);
    out.push_str(&render_table(&["Implementation", "Fixture", "Operation", "ops/s"], &rows));
    out
}
