use crate::draft::SchemaDraft;
use crate::implementation::Implementation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The measurable units exposed to the timing driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Compile,
    Validate,
    Serialize,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Compile, Operation::Validate, Operation::Serialize];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Compile => "compile",
            Operation::Validate => "validate",
            Operation::Serialize => "serialize",
        }
    }
}

/// Named benchmarks and the operations each one measures
///
/// `suite` times whole passes over the conformance corpus rather than the
/// bundled fixtures.
pub const NAMED_BENCHMARKS: [(&str, &[Operation]); 4] = [
    ("validate", &[Operation::Compile, Operation::Validate]),
    ("serialize", &[Operation::Serialize]),
    ("all", &Operation::ALL),
    ("suite", &[Operation::Validate]),
];

/// Operations measured by a named benchmark
pub fn operations_for(name: &str) -> Option<&'static [Operation]> {
    NAMED_BENCHMARKS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, ops)| *ops)
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistical effort of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkMode {
    /// Stable statistics, each implementation in its own process
    Full,
    /// Near-zero warm-up and a single short measurement, in process
    Smoke,
}

impl fmt::Display for BenchmarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkMode::Full => f.write_str("full"),
            BenchmarkMode::Smoke => f.write_str("smoke"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ok,
    Failed,
}

/// Summary statistics returned by a timing driver, in nanoseconds per operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroughputStatistic {
    pub mean_ns: f64,
    pub std_error_ns: f64,
    pub ci_lower_ns: f64,
    pub ci_upper_ns: f64,
    pub samples: u64,
}

impl ThroughputStatistic {
    pub fn ops_per_sec(&self) -> f64 {
        1e9 / self.mean_ns
    }

    /// Standard error carried over to the ops/sec scale (first-order)
    pub fn ops_error(&self) -> f64 {
        self.ops_per_sec() * self.std_error_ns / self.mean_ns
    }
}

/// One (implementation, fixture, operation) measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub implementation: Implementation,
    pub fixture: String,
    pub operation: Operation,
    pub draft: SchemaDraft,
    pub mode: BenchmarkMode,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_per_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_ns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_ns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BenchmarkRecord {
    pub fn measured(
        implementation: Implementation,
        fixture: &str,
        operation: Operation,
        draft: SchemaDraft,
        mode: BenchmarkMode,
        stat: ThroughputStatistic,
    ) -> Self {
        Self {
            implementation,
            fixture: fixture.to_string(),
            operation,
            draft,
            mode,
            status: RecordStatus::Ok,
            ops_per_sec: Some(stat.ops_per_sec()),
            ops_error: Some(stat.ops_error()),
            mean_ns: Some(stat.mean_ns),
            error_ns: Some(stat.std_error_ns),
            confidence_interval: Some([stat.ci_lower_ns, stat.ci_upper_ns]),
            samples: Some(stat.samples),
            message: None,
        }
    }

    pub fn failed(
        implementation: Implementation,
        fixture: &str,
        operation: Operation,
        draft: SchemaDraft,
        mode: BenchmarkMode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            implementation,
            fixture: fixture.to_string(),
            operation,
            draft,
            mode,
            status: RecordStatus::Failed,
            ops_per_sec: None,
            ops_error: None,
            mean_ns: None,
            error_ns: None,
            confidence_interval: None,
            samples: None,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }

    /// Fields that identify a record independently of its statistics
    pub fn identity(&self) -> (Implementation, &str, Operation, SchemaDraft) {
        (self.implementation, &self.fixture, self.operation, self.draft)
    }
}

/// All records of one named benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub mode: BenchmarkMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub records: Vec<BenchmarkRecord>,
}

impl BenchmarkReport {
    /// Records are kept sorted by identity
    pub fn new(name: impl Into<String>, mode: BenchmarkMode, mut records: Vec<BenchmarkRecord>) -> Self {
        records.sort_by(|a, b| {
            (a.implementation, &a.fixture, a.operation).cmp(&(b.implementation, &b.fixture, b.operation))
        });
        Self {
            name: name.into(),
            mode,
            run_id: None,
            generated_at: None,
            records,
        }
    }

    /// Attach run metadata; callers decide whether reports carry it
    pub fn with_run_metadata(mut self, run_id: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        self.run_id = Some(run_id.into());
        self.generated_at = Some(generated_at);
        self
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_ok()).count()
    }
}
