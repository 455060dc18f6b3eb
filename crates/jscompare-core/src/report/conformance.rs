//! Conformance reports: `functional-summary.md`, `functional-summary.json`
//! and `per-draft.md`

use super::table::Table;
use crate::conformance::{Cell, Counts, ResultsMatrix};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SUMMARY_MARKDOWN: &str = "functional-summary.md";
pub const SUMMARY_JSON: &str = "functional-summary.json";
pub const PER_DRAFT_MARKDOWN: &str = "per-draft.md";

const COL_IMPLEMENTATION: &str = "Implementations";
const COL_OVERALL: &str = "Overall";

/// A finished conformance run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    #[serde(with = "duration_millis", rename = "durationMs")]
    pub duration: Duration,
    pub results: ResultsMatrix,
}

impl RunSummary {
    pub fn new(results: ResultsMatrix, duration: Duration) -> Self {
        Self { duration, results }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// `value / total` as a percentage with one decimal place, rounded half to even
///
/// A zero denominator renders as `0.0`.
pub fn percentage(value: u64, total: u64) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    let scaled = u128::from(value) * 1000;
    let total = u128::from(total);
    let mut tenths = scaled / total;
    let remainder = scaled % total;
    if remainder * 2 > total || (remainder * 2 == total && tenths % 2 == 1) {
        tenths += 1;
    }
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn tier(counts: &Counts, value: u64) -> String {
    format!("{} ({}%)", value, percentage(value, counts.applicable()))
}

/// Summary cell text; empty when the cell saw no cases
fn cell_text(cell: &Cell) -> String {
    if cell.overall().is_empty() {
        return String::new();
    }
    let (r, o) = (&cell.required, &cell.optional);
    let mut text = format!(
        "pass: r:{} o:{}<br>fail: r:{} o:{}",
        tier(r, r.pass),
        tier(o, o.pass),
        tier(r, r.fail),
        tier(o, o.fail),
    );
    if r.error + o.error > 0 {
        text.push_str(&format!("<br>error: r:{} o:{}", tier(r, r.error), tier(o, o.error)));
    }
    if r.skipped + o.skipped > 0 {
        text.push_str(&format!("<br>skip: r:{} o:{}", r.skipped, o.skipped));
    }
    text
}

/// `Time: s.mmms`
pub fn format_elapsed(duration: Duration) -> String {
    format!("Time: {}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

/// Table of implementations × (overall, each draft with data)
pub fn summary_markdown(summary: &RunSummary) -> String {
    let matrix = &summary.results;
    let drafts = matrix.drafts();

    let mut headers = vec![COL_IMPLEMENTATION.to_string(), COL_OVERALL.to_string()];
    headers.extend(drafts.iter().map(|d| d.display_name().to_string()));
    let mut table = Table::new(headers);

    for implementation in matrix.implementations() {
        let mut row = vec![
            implementation.short_name().to_string(),
            cell_text(&matrix.overall(implementation)),
        ];
        row.extend(drafts.iter().map(|&draft| {
            matrix
                .cell(implementation, draft)
                .map(cell_text)
                .unwrap_or_default()
        }));
        table.push_row(row);
    }

    format!("{}\n\n{}", table, format_elapsed(summary.duration))
}

pub fn summary_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Parse a previously written `functional-summary.json`
pub fn read_summary_json(text: &str) -> Result<RunSummary> {
    serde_json::from_str(text).map_err(|e| Error::report(format!("unreadable functional summary: {}", e)))
}

/// One section per draft, one table per implementation, one row per source file
pub fn per_draft_markdown(matrix: &ResultsMatrix) -> String {
    let mut sections = Vec::new();
    for draft in matrix.drafts() {
        let mut section = format!("## {}\n", draft.display_name());
        for implementation in matrix.implementations() {
            let Some(cell) = matrix.cell(implementation, draft) else {
                continue;
            };
            let mut table = Table::new(["suite", "pass", "fail", "skip", "error", "total"]).right_align_from(1);
            for (file, counts) in &cell.files {
                table.push_row([
                    file.clone(),
                    counts.pass.to_string(),
                    counts.fail.to_string(),
                    counts.skipped.to_string(),
                    counts.error.to_string(),
                    counts.total().to_string(),
                ]);
            }
            section.push_str(&format!("\n### {}\n\n{}", implementation.short_name(), table));
        }
        sections.push(section);
    }
    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_half_even() {
        assert_eq!(percentage(1, 3), "33.3");
        assert_eq!(percentage(2, 3), "66.7");
        assert_eq!(percentage(3, 3), "100.0");
        assert_eq!(percentage(0, 0), "0.0");
        // 1/16 = 6.25% -> 6.2 (ties go to even)
        assert_eq!(percentage(1, 16), "6.2");
        // 3/16 = 18.75% -> 18.8
        assert_eq!(percentage(3, 16), "18.8");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(61_005)), "Time: 61.005s");
    }

    #[test]
    fn test_empty_cell_renders_blank() {
        assert_eq!(cell_text(&Cell::default()), "");
    }
}
