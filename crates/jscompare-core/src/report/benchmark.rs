//! Benchmark reports: `<name>.json`, `<name>.md` and `benchmark_results.csv`
//!
//! The Markdown is always rendered from JSON that has been read back and
//! validated, never from in-memory records directly.

use super::table::Table;
use crate::benchmark::{BenchmarkRecord, BenchmarkReport, Operation, RecordStatus};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};

pub const CSV_FILE: &str = "benchmark_results.csv";

pub fn to_json(report: &BenchmarkReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Structural checks on benchmark data
///
/// Implementation and draft names are checked by deserialization itself.
pub fn validate_report(report: &BenchmarkReport) -> Result<()> {
    let mut seen = HashSet::new();
    for record in &report.records {
        if !seen.insert(record.identity()) {
            return Err(Error::report(format!(
                "duplicate record for {} / {} / {}",
                record.implementation, record.fixture, record.operation
            )));
        }
        match record.status {
            RecordStatus::Ok => {
                let usable = record
                    .ops_per_sec
                    .map(|ops| ops.is_finite() && ops > 0.0)
                    .unwrap_or(false);
                if !usable {
                    return Err(Error::report(format!(
                        "record {} / {} / {} has no positive finite throughput",
                        record.implementation, record.fixture, record.operation
                    )));
                }
            }
            RecordStatus::Failed => {
                if record.message.as_deref().map_or(true, str::is_empty) {
                    return Err(Error::report(format!(
                        "failed record {} / {} / {} carries no message",
                        record.implementation, record.fixture, record.operation
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Parse and validate benchmark JSON
pub fn read_report(text: &str) -> Result<BenchmarkReport> {
    let report: BenchmarkReport = serde_json::from_str(text)
        .map_err(|e| Error::report(format!("unreadable benchmark data: {}", e)))?;
    validate_report(&report)?;
    Ok(report)
}

/// Group digits in threes: `1234567.8` -> `1,234,568`
fn thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn throughput_cell(record: &BenchmarkRecord) -> String {
    match (record.status, record.ops_per_sec) {
        (RecordStatus::Ok, Some(ops)) => match record.ops_error {
            Some(err) => format!("{} ± {}", thousands(ops), thousands(err)),
            None => thousands(ops),
        },
        _ => "failed".to_string(),
    }
}

/// Table of (implementation, fixture) × operation in ops/s
pub fn to_markdown(report: &BenchmarkReport) -> String {
    let mut rows: BTreeMap<(_, &str), BTreeMap<Operation, String>> = BTreeMap::new();
    for record in &report.records {
        rows.entry((record.implementation, record.fixture.as_str()))
            .or_default()
            .insert(record.operation, throughput_cell(record));
    }

    let mut headers = vec!["Implementation".to_string(), "Fixture".to_string()];
    headers.extend(Operation::ALL.iter().map(|op| format!("{} (ops/s)", op)));
    let mut table = Table::new(headers).right_align_from(2);
    for ((implementation, fixture), cells) in &rows {
        let mut row = vec![implementation.short_name().to_string(), fixture.to_string()];
        row.extend(
            Operation::ALL
                .iter()
                .map(|op| cells.get(op).cloned().unwrap_or_default()),
        );
        table.push_row(row);
    }

    let mut out = format!("# {} ({})\n\n{}", report.name, report.mode, table);
    let failures: Vec<_> = report.records.iter().filter(|r| !r.is_ok()).collect();
    if !failures.is_empty() {
        out.push_str("\nFailed:\n\n");
        for record in failures {
            out.push_str(&format!(
                "- {} / {} / {}: {}\n",
                record.implementation,
                record.fixture,
                record.operation,
                record.message.as_deref().unwrap_or_default()
            ));
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn to_csv(report: &BenchmarkReport) -> String {
    let mut out = String::from(
        "benchmark,implementation,fixture,operation,draft,mode,status,ops_per_sec,ops_error,mean_ns,error_ns,ci_lower_ns,ci_upper_ns,samples,message\n",
    );
    for r in &report.records {
        let (ci_lower, ci_upper) = match r.confidence_interval {
            Some([lo, hi]) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        let status = match r.status {
            RecordStatus::Ok => "ok",
            RecordStatus::Failed => "failed",
        };
        let fields = [
            csv_field(&report.name),
            r.implementation.short_name().to_string(),
            csv_field(&r.fixture),
            r.operation.to_string(),
            r.draft.to_string(),
            r.mode.to_string(),
            status.to_string(),
            csv_number(r.ops_per_sec),
            csv_number(r.ops_error),
            csv_number(r.mean_ns),
            csv_number(r.error_ns),
            csv_number(ci_lower),
            csv_number(ci_upper),
            csv_number(r.samples),
            csv_field(r.message.as_deref().unwrap_or_default()),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
