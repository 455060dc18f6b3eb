//! Per-implementation process isolation for full benchmark runs
//!
//! The current executable is re-invoked once per implementation with a
//! worker flag pair. The child measures only that implementation and writes
//! its records as JSON; the parent collects them. A child that crashes or
//! exits non-zero only loses its own implementation's records.

use super::fixture::BenchmarkFixture;
use super::record::{BenchmarkMode, BenchmarkRecord, Operation};
use super::workload::SuiteWorkload;
use crate::error::{Error, Result};
use crate::implementation::Implementation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Flag naming the implementation a worker process measures
pub const WORKER_FLAG: &str = "--worker";
/// Flag naming the file a worker process writes its records to
pub const WORKER_OUT_FLAG: &str = "--worker-out";

/// How to launch a worker process
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    /// Arguments placed before the worker flags
    leading: Vec<OsString>,
    /// Arguments placed after the worker flags, typically driver pass-through
    trailing: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, leading: Vec<OsString>, trailing: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            leading,
            trailing,
        }
    }

    /// Re-invoke the running executable
    pub fn current_exe(leading: Vec<OsString>, trailing: Vec<OsString>) -> Result<Self> {
        let program = std::env::current_exe().map_err(|e| Error::Io {
            message: "locating the current executable".to_string(),
            source: e,
        })?;
        Ok(Self::new(program, leading, trailing))
    }

    pub fn arguments(&self, implementation: Implementation, out: &Path) -> Vec<OsString> {
        let mut args = self.leading.clone();
        args.push(WORKER_FLAG.into());
        args.push(implementation.short_name().into());
        args.push(WORKER_OUT_FLAG.into());
        args.push(out.as_os_str().to_owned());
        args.extend(self.trailing.iter().cloned());
        args
    }

    /// Run one worker to completion and read back its records
    pub fn run(&self, implementation: Implementation, scratch: &Path) -> Result<Vec<BenchmarkRecord>> {
        let out = scratch.join(format!("{}.records.json", implementation.short_name().to_lowercase()));
        info!(%implementation, program = %self.program.display(), "Starting benchmark worker");

        let status = Command::new(&self.program)
            .args(self.arguments(implementation, &out))
            .status()
            .map_err(|e| Error::Io {
                message: format!("spawning worker for {}", implementation),
                source: e,
            })?;
        if !status.success() {
            return Err(Error::Benchmark {
                implementation: implementation.short_name().to_string(),
                operation: "worker".to_string(),
                message: format!("worker process exited with {}", status),
            });
        }

        read_records(&out)
    }
}

pub fn write_records(path: &Path, records: &[BenchmarkRecord]) -> Result<()> {
    let text = serde_json::to_string_pretty(records)?;
    std::fs::write(path, text).map_err(|e| Error::Io {
        message: format!("writing {}", path.display()),
        source: e,
    })
}

pub fn read_records(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
        message: format!("reading {}", path.display()),
        source: e,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Failed records standing in for a worker that produced nothing
pub fn failed_records(
    implementation: Implementation,
    fixtures: &[BenchmarkFixture],
    operations: &[Operation],
    mode: BenchmarkMode,
    message: &str,
) -> Vec<BenchmarkRecord> {
    warn!(%implementation, error = message, "Benchmark worker failed");
    fixtures
        .iter()
        .filter(|f| implementation.supports(f.draft))
        .flat_map(|f| {
            operations.iter().map(move |&op| {
                BenchmarkRecord::failed(implementation, &f.name, op, f.draft, mode, message)
            })
        })
        .collect()
}

/// Failed records standing in for a worker that never finished its corpus passes
pub fn failed_workload_records(
    implementation: Implementation,
    workloads: &[SuiteWorkload],
    mode: BenchmarkMode,
    message: &str,
) -> Vec<BenchmarkRecord> {
    warn!(%implementation, error = message, "Suite benchmark worker failed");
    workloads
        .iter()
        .filter(|w| implementation.supports(w.draft))
        .map(|w| BenchmarkRecord::failed(implementation, &w.name(), Operation::Validate, w.draft, mode, message))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::fixture::FixtureInstance;
    use crate::draft::SchemaDraft;

    #[test]
    fn test_worker_arguments_order() {
        let command = WorkerCommand::new(
            "/bin/jscompare",
            vec!["bench".into(), "validate".into()],
            vec!["--".into(), "--sample-size".into(), "20".into()],
        );
        let args = command.arguments(Implementation::Valico, Path::new("/tmp/v.json"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["bench", "validate", "--worker", "Valico", "--worker-out", "/tmp/v.json", "--", "--sample-size", "20"]
        );
    }

    #[test]
    fn test_records_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        let records = vec![BenchmarkRecord::failed(
            Implementation::Jsonschema,
            "f",
            Operation::Compile,
            SchemaDraft::Draft7,
            BenchmarkMode::Full,
            "boom",
        )];
        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_failed_records_cover_supported_fixtures() {
        let make = |name: &str, schema: &str| {
            BenchmarkFixture::new(
                name,
                schema.to_string(),
                vec![FixtureInstance {
                    name: "a".to_string(),
                    text: "{}".to_string(),
                }],
            )
            .unwrap()
        };
        let fixtures = vec![
            make("d7", r#"{"$schema":"http://json-schema.org/draft-07/schema#"}"#),
            make("d2020", r#"{"$schema":"https://json-schema.org/draft/2020-12/schema"}"#),
        ];
        let records = failed_records(Implementation::Valico, &fixtures, &Operation::ALL, BenchmarkMode::Full, "crashed");
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.fixture == "d7" && !r.is_ok()));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_worker_is_benchmark_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = WorkerCommand::new("false", vec![], vec![]);
        let err = command.run(Implementation::Jsonschema, dir.path()).unwrap_err();
        assert!(matches!(err, Error::Benchmark { .. }));
    }

    #[test]
    fn test_failed_workload_records_skip_unsupported_drafts() {
        let workloads = [SchemaDraft::Draft4, SchemaDraft::Draft2019_09].map(|draft| SuiteWorkload {
            draft,
            cases: Vec::new(),
        });
        let records = failed_workload_records(Implementation::JsonschemaValid, &workloads, BenchmarkMode::Full, "crashed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fixture, "suite-draft4");
        assert_eq!(records[0].operation, Operation::Validate);
        assert_eq!(records[0].message.as_deref(), Some("crashed"));
    }
}
