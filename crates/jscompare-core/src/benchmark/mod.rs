//! Benchmark orchestration
//!
//! Fixtures are measured per implementation and operation through a
//! [`TimingDriver`]; corpus workloads are measured as whole passes per draft. [`CriterionDriver`] is the production driver; smoke
//! runs use it in process, full runs isolate each implementation in a
//! worker process (see [`isolation`]).

mod criterion_driver;
mod driver;
mod fixture;
pub mod isolation;
mod orchestrator;
mod record;
mod workload;

pub use criterion_driver::CriterionDriver;
pub use driver::{sanitize_id, BenchmarkId, DriverSettings, TimingDriver};
pub use fixture::{BenchmarkFixture, FixtureInstance};
pub use orchestrator::BenchmarkOrchestrator;
pub use record::{
    operations_for, BenchmarkMode, BenchmarkRecord, BenchmarkReport, Operation, RecordStatus,
    ThroughputStatistic, NAMED_BENCHMARKS,
};
pub use workload::{is_suite_benchmark, SuiteWorkload, SUITE_BENCHMARK};
