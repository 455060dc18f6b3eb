use super::case::{ConformanceResult, Verdict};
use crate::draft::SchemaDraft;
use crate::implementation::Implementation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign};

/// Verdict tallies
///
/// `skipped` is kept alongside but outside the applicable total: a skipped
/// case never enters an implementation's pass/fail denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub pass: u64,
    pub fail: u64,
    pub skipped: u64,
    pub error: u64,
}

impl Counts {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Fail => self.fail += 1,
            Verdict::Skipped => self.skipped += 1,
            Verdict::Error => self.error += 1,
        }
    }

    /// Cases the implementation was actually judged on
    pub fn applicable(&self) -> u64 {
        self.pass + self.fail + self.error
    }

    pub fn total(&self) -> u64 {
        self.applicable() + self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Add for Counts {
    type Output = Counts;

    fn add(self, rhs: Counts) -> Counts {
        Counts {
            pass: self.pass + rhs.pass,
            fail: self.fail + rhs.fail,
            skipped: self.skipped + rhs.skipped,
            error: self.error + rhs.error,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Counts) {
        *self = *self + rhs;
    }
}

/// Aggregated results for one (draft, implementation) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub required: Counts,
    pub optional: Counts,
    /// Per source file, keyed by path relative to the draft directory
    #[serde(default)]
    pub files: BTreeMap<String, Counts>,
}

impl Cell {
    pub fn overall(&self) -> Counts {
        self.required + self.optional
    }

    fn record(&mut self, result: &ConformanceResult) {
        if result.optional {
            self.optional.record(result.verdict);
        } else {
            self.required.record(result.verdict);
        }
        self.files
            .entry(result.file.clone())
            .or_default()
            .record(result.verdict);
    }

    fn merge(&mut self, other: &Cell) {
        self.required += other.required;
        self.optional += other.optional;
        for (file, counts) in &other.files {
            *self.files.entry(file.clone()).or_default() += *counts;
        }
    }
}

/// A cell whose failures grew compared with a baseline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Regression {
    pub implementation: Implementation,
    pub draft: SchemaDraft,
    pub baseline: Counts,
    pub current: Counts,
}

/// Mapping from (implementation, draft) to aggregated counts
///
/// Built by a pure reduction over results, so the order in which results
/// arrive (including interleaving across parallel workers) does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsMatrix {
    cells: BTreeMap<Implementation, BTreeMap<SchemaDraft, Cell>>,
}

impl ResultsMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ConformanceResult>) -> Self {
        let mut matrix = Self::new();
        for result in results {
            matrix.record(result);
        }
        matrix
    }

    pub fn record(&mut self, result: &ConformanceResult) {
        self.cells
            .entry(result.implementation)
            .or_default()
            .entry(result.draft)
            .or_default()
            .record(result);
    }

    pub fn merge(&mut self, other: &ResultsMatrix) {
        for (imp, drafts) in &other.cells {
            let mine = self.cells.entry(*imp).or_default();
            for (draft, cell) in drafts {
                mine.entry(*draft).or_default().merge(cell);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, implementation: Implementation, draft: SchemaDraft) -> Option<&Cell> {
        self.cells.get(&implementation)?.get(&draft)
    }

    pub fn implementations(&self) -> impl Iterator<Item = Implementation> + '_ {
        self.cells.keys().copied()
    }

    /// Drafts with at least one recorded result for any implementation
    pub fn drafts(&self) -> BTreeSet<SchemaDraft> {
        self.cells
            .values()
            .flat_map(|drafts| drafts.iter())
            .filter(|(_, cell)| !cell.overall().is_empty())
            .map(|(draft, _)| *draft)
            .collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = (Implementation, SchemaDraft, &Cell)> + '_ {
        self.cells.iter().flat_map(|(imp, drafts)| {
            drafts.iter().map(move |(draft, cell)| (*imp, *draft, cell))
        })
    }

    /// Sum of every draft's cell for one implementation
    pub fn overall(&self, implementation: Implementation) -> Cell {
        let mut total = Cell::default();
        if let Some(drafts) = self.cells.get(&implementation) {
            for cell in drafts.values() {
                total.required += cell.required;
                total.optional += cell.optional;
            }
        }
        total
    }

    pub fn error_count(&self) -> u64 {
        self.cells().map(|(_, _, cell)| cell.overall().error).sum()
    }

    /// Cells whose FAIL or ERROR count grew relative to `baseline`
    ///
    /// Implementations or drafts absent from the baseline are new coverage,
    /// not regressions.
    pub fn regressions_against(&self, baseline: &ResultsMatrix) -> Vec<Regression> {
        self.cells()
            .filter_map(|(imp, draft, cell)| {
                let before = baseline.cell(imp, draft)?.overall();
                let now = cell.overall();
                (now.fail > before.fail || now.error > before.error).then_some(Regression {
                    implementation: imp,
                    draft,
                    baseline: before,
                    current: now,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(imp: Implementation, draft: SchemaDraft, file: &str, optional: bool, verdict: Verdict) -> ConformanceResult {
        ConformanceResult {
            implementation: imp,
            draft,
            file: file.to_string(),
            group: "g".to_string(),
            description: "c".to_string(),
            optional,
            expected: true,
            actual: None,
            verdict,
            detail: None,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_counts_separate_skipped_from_applicable() {
        let mut counts = Counts::default();
        for v in [Verdict::Pass, Verdict::Pass, Verdict::Fail, Verdict::Skipped, Verdict::Error] {
            counts.record(v);
        }
        assert_eq!(counts.applicable(), 4);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_cells_split_required_optional_and_files() {
        let results = vec![
            result(Implementation::Valico, SchemaDraft::Draft7, "type.json", false, Verdict::Pass),
            result(Implementation::Valico, SchemaDraft::Draft7, "type.json", false, Verdict::Fail),
            result(Implementation::Valico, SchemaDraft::Draft7, "optional/bignum.json", true, Verdict::Pass),
            result(Implementation::Valico, SchemaDraft::Draft4, "type.json", false, Verdict::Error),
        ];
        let matrix = ResultsMatrix::from_results(&results);

        let cell = matrix.cell(Implementation::Valico, SchemaDraft::Draft7).unwrap();
        assert_eq!(cell.required.pass, 1);
        assert_eq!(cell.required.fail, 1);
        assert_eq!(cell.optional.pass, 1);
        assert_eq!(cell.files["type.json"].applicable(), 2);
        assert_eq!(matrix.error_count(), 1);
        assert_eq!(matrix.overall(Implementation::Valico).overall().total(), 4);
    }

    #[test]
    fn test_merge_matches_single_pass_reduction() {
        let results = vec![
            result(Implementation::Jsonschema, SchemaDraft::Draft7, "a.json", false, Verdict::Pass),
            result(Implementation::Valico, SchemaDraft::Draft7, "a.json", false, Verdict::Fail),
            result(Implementation::Jsonschema, SchemaDraft::Draft2020_12, "b.json", true, Verdict::Skipped),
        ];
        let whole = ResultsMatrix::from_results(&results);

        let mut left = ResultsMatrix::from_results(&results[..1]);
        let right = ResultsMatrix::from_results(&results[1..]);
        left.merge(&right);
        assert_eq!(left, whole);
    }

    #[test]
    fn test_regressions_against_baseline() {
        let baseline = ResultsMatrix::from_results(&[
            result(Implementation::Valico, SchemaDraft::Draft7, "a.json", false, Verdict::Fail),
            result(Implementation::Jsonschema, SchemaDraft::Draft7, "a.json", false, Verdict::Pass),
        ]);
        let current = ResultsMatrix::from_results(&[
            result(Implementation::Valico, SchemaDraft::Draft7, "a.json", false, Verdict::Fail),
            result(Implementation::Jsonschema, SchemaDraft::Draft7, "a.json", false, Verdict::Fail),
            result(Implementation::JsonschemaValid, SchemaDraft::Draft7, "a.json", false, Verdict::Fail),
        ]);

        let regressions = current.regressions_against(&baseline);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].implementation, Implementation::Jsonschema);
        assert_eq!(regressions[0].current.fail, 1);
        assert!(baseline.regressions_against(&baseline).is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let matrix = ResultsMatrix::from_results(&[result(
            Implementation::JsonschemaValid,
            SchemaDraft::Draft6,
            "enum.json",
            false,
            Verdict::Pass,
        )]);
        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["JsonschemaValid"]["draft6"]["required"]["pass"], 1);
        let back: ResultsMatrix = serde_json::from_value(json).unwrap();
        assert_eq!(back, matrix);
    }
}
