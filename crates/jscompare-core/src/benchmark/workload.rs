//! The conformance corpus as a benchmark workload
//!
//! Only cases expected to pass are timed: the cost of building error
//! reports varies far more between validators than the cost of accepting a
//! document, and production traffic is overwhelmingly valid.

use crate::conformance::ConformanceCase;
use crate::draft::SchemaDraft;
use std::collections::BTreeMap;

/// Name of the benchmark that times passes over the corpus
pub const SUITE_BENCHMARK: &str = "suite";

/// Whether a named benchmark reads the corpus rather than fixtures
pub fn is_suite_benchmark(name: &str) -> bool {
    name.eq_ignore_ascii_case(SUITE_BENCHMARK)
}

/// One draft's valid cases, timed as a single pass
#[derive(Debug, Clone)]
pub struct SuiteWorkload {
    pub draft: SchemaDraft,
    pub cases: Vec<ConformanceCase>,
}

impl SuiteWorkload {
    /// Group the cases expected to validate by draft, in draft order
    pub fn from_cases(cases: &[ConformanceCase]) -> Vec<SuiteWorkload> {
        let mut by_draft: BTreeMap<SchemaDraft, Vec<ConformanceCase>> = BTreeMap::new();
        for case in cases.iter().filter(|c| c.expected) {
            by_draft.entry(case.draft).or_default().push(case.clone());
        }
        by_draft
            .into_iter()
            .map(|(draft, cases)| SuiteWorkload { draft, cases })
            .collect()
    }

    /// Fixture name carried by this workload's records
    pub fn name(&self) -> String {
        format!("{}-{}", SUITE_BENCHMARK, self.draft)
    }
}
