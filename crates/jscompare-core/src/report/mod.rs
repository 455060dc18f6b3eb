//! Report emitter
//!
//! Rendering functions are pure: they take a finished matrix or record set
//! and return text. The `write_*` functions put that text on disk under an
//! output directory.

pub mod benchmark;
pub mod conformance;
pub mod implementations;
mod table;

pub use conformance::RunSummary;
pub use table::{Align, Table};

use crate::benchmark::{BenchmarkMode, BenchmarkReport};
use crate::error::{Error, Result};
use crate::implementation::Implementation;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::Io {
        message: format!("creating {}", dir.display()),
        source: e,
    })?;
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|e| Error::Io {
        message: format!("writing {}", path.display()),
        source: e,
    })?;
    info!(path = %path.display(), "Report written");
    Ok(path)
}

/// Write `functional-summary.md`, `functional-summary.json` and `per-draft.md`
pub fn write_conformance_reports(dir: &Path, summary: &RunSummary) -> Result<Vec<PathBuf>> {
    Ok(vec![
        write_file(dir, conformance::SUMMARY_MARKDOWN, &conformance::summary_markdown(summary))?,
        write_file(dir, conformance::SUMMARY_JSON, &conformance::summary_json(summary)?)?,
        write_file(
            dir,
            conformance::PER_DRAFT_MARKDOWN,
            &conformance::per_draft_markdown(&summary.results),
        )?,
    ])
}

/// Write `<name>.json`, then `<name>.md` rendered from the re-read JSON, and
/// for full runs `benchmark_results.csv`
pub fn write_benchmark_reports(dir: &Path, report: &BenchmarkReport) -> Result<Vec<PathBuf>> {
    let json_path = write_file(dir, &format!("{}.json", report.name), &benchmark::to_json(report)?)?;
    let text = fs::read_to_string(&json_path).map_err(|e| Error::Io {
        message: format!("reading back {}", json_path.display()),
        source: e,
    })?;
    let reread = benchmark::read_report(&text)?;

    let mut written = vec![
        json_path,
        write_file(dir, &format!("{}.md", reread.name), &benchmark::to_markdown(&reread))?,
    ];
    if reread.mode == BenchmarkMode::Full {
        written.push(write_file(dir, benchmark::CSV_FILE, &benchmark::to_csv(&reread))?);
    }
    Ok(written)
}

/// Write `implementations.json`
pub fn write_implementations(dir: &Path, implementations: &[Implementation]) -> Result<PathBuf> {
    write_file(
        dir,
        implementations::IMPLEMENTATIONS_JSON,
        &implementations::implementations_json(implementations)?,
    )
}
