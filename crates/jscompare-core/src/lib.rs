//! jscompare Core - Functional and performance comparison of JSON Schema validators
//!
//! This crate wraps several JSON Schema validator libraries behind one
//! capability contract, runs them against a shared conformance corpus and
//! measures their throughput on benchmark fixtures.
//!
//! # Main Components
//!
//! - **Implementations**: One adapter per wrapped library, selected from a fixed set
//! - **Conformance**: Runner producing per-case verdicts and a results matrix
//! - **Benchmarks**: Orchestrator that drives operations through a timing driver
//! - **Reports**: Markdown, JSON and CSV renderers
//!
//! # Example
//!
//! ```no_run
//! use jscompare_core::{Implementation, RemoteSchemas, Result, SchemaDraft};
//! use std::sync::Arc;
//!
//! fn example() -> Result<()> {
//!     let remotes = Arc::new(RemoteSchemas::empty());
//!     let compiled = Implementation::Jsonschema.compile(r#"{"type":"integer"}"#, SchemaDraft::Draft7, &remotes)?;
//!     let outcome = Implementation::Jsonschema.validate(&compiled, "\"text\"")?;
//!     assert!(!outcome.valid);
//!     Ok(())
//! }
//! ```

pub mod benchmark;
pub mod conformance;
pub mod document;
pub mod draft;
pub mod error;
pub mod implementation;
pub mod remotes;
pub mod report;
pub mod skip;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use draft::SchemaDraft;
pub use remotes::{RemoteSchemas, DEFAULT_REMOTE_BASE};
pub use implementation::{
    CompiledSchema, ErrorDescriptor, Implementation, MetaData, ValidationOutcome,
    ValidatorImplementation,
};
pub use document::{DocumentModel, TestModel, TypedModel, ValueModel};
pub use skip::{SkipPolicy, SkipRule, SkipRuleSpec};
pub use conformance::{
    Cell, ConformanceCase, ConformanceResult, ConformanceRunner, Counts, NoopObserver, Regression,
    ResultsMatrix, RunObserver, RunnerConfig, Verdict, DEFAULT_CASE_TIMEOUT,
};
pub use benchmark::{
    BenchmarkFixture, BenchmarkMode, BenchmarkOrchestrator, BenchmarkRecord, BenchmarkReport,
    CriterionDriver, DriverSettings, FixtureInstance, Operation, RecordStatus, ThroughputStatistic,
    TimingDriver,
};
pub use report::RunSummary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
