//! Conformance testing against the external test-suite corpus

mod case;
mod matrix;
mod runner;

pub use case::{ConformanceCase, ConformanceResult, Verdict};
pub use matrix::{Cell, Counts, Regression, ResultsMatrix};
pub use runner::{ConformanceRunner, NoopObserver, RunObserver, RunnerConfig, DEFAULT_CASE_TIMEOUT};
