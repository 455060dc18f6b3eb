//! Benchmark command handler
//!
//! Fixture benchmarks time compile, validate and serialize per fixture; the
//! `suite` benchmark times one pass over each draft's valid corpus cases.
//! Smoke runs measure every implementation in this process. Full runs
//! re-invoke the binary once per implementation with the hidden worker
//! flags, so one validator's allocator state never carries into another's
//! measurements. Workers always measure in full mode and receive the
//! parent's effective driver settings as pass-through flags.

use super::{parse_drafts, select_implementations};
use crate::cli::BenchArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{current_run_id, timing::Timer};
use crate::output::OutputWriter;
use chrono::Utc;
use jscompare_core::benchmark::isolation::{self, WorkerCommand};
use jscompare_core::benchmark::{is_suite_benchmark, operations_for, SuiteWorkload};
use jscompare_core::report;
use jscompare_core::{
    BenchmarkFixture, BenchmarkMode, BenchmarkOrchestrator, BenchmarkRecord, BenchmarkReport,
    CriterionDriver, DriverSettings, Implementation, Operation, SchemaDraft, SkipPolicy, SkipRuleSpec,
};
use jscompare_suite::{CorpusLoader, FixtureLoader};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A named benchmark and the operations it measures
type NamedBenchmark = (String, &'static [Operation]);

fn resolve_benchmarks(names: &[String]) -> Result<Vec<NamedBenchmark>> {
    let mut resolved: Vec<NamedBenchmark> = Vec::new();
    for name in names {
        let operations = operations_for(name).ok_or_else(|| Error::UnknownBenchmark { name: name.clone() })?;
        let name = name.to_lowercase();
        if !resolved.iter().any(|(n, _)| *n == name) {
            resolved.push((name, operations));
        }
    }
    Ok(resolved)
}

/// What one named benchmark measures
#[derive(Debug, Clone)]
enum Workload {
    Fixtures {
        fixtures: Vec<BenchmarkFixture>,
        operations: Vec<Operation>,
    },
    Suite(Vec<SuiteWorkload>),
}

impl Workload {
    fn describe(&self) -> String {
        match self {
            Workload::Fixtures { fixtures, .. } => format!("{} fixture(s)", fixtures.len()),
            Workload::Suite(workloads) => format!("{} corpus draft(s)", workloads.len()),
        }
    }

    /// Records for an implementation whose worker produced nothing
    fn failed_records(&self, implementation: Implementation, message: &str) -> Vec<BenchmarkRecord> {
        match self {
            Workload::Fixtures { fixtures, operations } => {
                isolation::failed_records(implementation, fixtures, operations, BenchmarkMode::Full, message)
            }
            Workload::Suite(workloads) => {
                isolation::failed_workload_records(implementation, workloads, BenchmarkMode::Full, message)
            }
        }
    }
}

/// Where benchmark inputs are read from
#[derive(Debug, Clone)]
struct Inputs {
    benchmarks_dir: PathBuf,
    fixtures: Vec<String>,
    suite_dir: PathBuf,
    drafts: Vec<SchemaDraft>,
    skip: Vec<SkipRuleSpec>,
}

impl Inputs {
    fn resolve(args: &BenchArgs, config: &Config) -> Result<Self> {
        Ok(Self {
            benchmarks_dir: args
                .benchmarks_dir
                .clone()
                .unwrap_or_else(|| config.paths.benchmarks_dir.clone()),
            fixtures: args.fixtures.clone(),
            suite_dir: args.suite.clone().unwrap_or_else(|| config.paths.suite_dir.clone()),
            drafts: parse_drafts(&args.drafts)?,
            skip: config.functional.skip.clone(),
        })
    }

    /// Load what the named benchmark measures
    fn load(&self, name: &str, operations: &[Operation], implementations: &[Implementation]) -> Result<Workload> {
        if !is_suite_benchmark(name) {
            let fixtures = FixtureLoader::new(&self.benchmarks_dir).load_many(&self.fixtures)?;
            return Ok(Workload::Fixtures {
                fixtures,
                operations: operations.to_vec(),
            });
        }

        let _load_timer = Timer::with_details("corpus_loading", &self.suite_dir.display().to_string());
        let mut corpus = CorpusLoader::new(&self.suite_dir).load(&self.drafts)?;
        let policy = SkipPolicy::new(implementations, &self.skip)?;
        policy.annotate(implementations, &mut corpus.cases);
        Ok(Workload::Suite(SuiteWorkload::from_cases(&corpus.cases)))
    }

    /// Arguments a worker needs before the worker flags
    fn worker_leading(&self, name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--quiet".into(), "bench".into(), name.into()];
        if is_suite_benchmark(name) {
            args.push("--suite".into());
            args.push(self.suite_dir.as_os_str().to_owned());
            for draft in &self.drafts {
                args.push("--draft".into());
                args.push(draft.to_string().into());
            }
        } else {
            args.push("--benchmarks-dir".into());
            args.push(self.benchmarks_dir.as_os_str().to_owned());
            for fixture in &self.fixtures {
                args.push("--fixture".into());
                args.push(fixture.as_str().into());
            }
        }
        args
    }
}

/// Driver settings rendered back into pass-through flags
pub(crate) fn settings_to_args(settings: &DriverSettings) -> Vec<String> {
    vec![
        "--warm-up-time".to_string(),
        settings.warm_up.as_secs_f64().to_string(),
        "--measurement-time".to_string(),
        settings.measurement.as_secs_f64().to_string(),
        "--sample-size".to_string(),
        settings.sample_size.to_string(),
        "--nresamples".to_string(),
        settings.resamples.to_string(),
    ]
}

fn worker_trailing(settings: &DriverSettings) -> Vec<OsString> {
    std::iter::once("--".to_string())
        .chain(settings_to_args(settings))
        .map(OsString::from)
        .collect()
}

/// Measure in this process, off the async runtime
async fn measure(
    implementations: Vec<Implementation>,
    workload: Workload,
    settings: DriverSettings,
    mode: BenchmarkMode,
) -> Result<Vec<BenchmarkRecord>> {
    let scratch = tempfile::tempdir()?;
    tokio::task::spawn_blocking(move || {
        let driver = CriterionDriver::new(scratch.path(), settings);
        match workload {
            Workload::Fixtures { fixtures, operations } => BenchmarkOrchestrator::new(driver, mode)
                .with_operations(&operations)
                .run(&implementations, &fixtures),
            Workload::Suite(workloads) => {
                BenchmarkOrchestrator::new(driver, mode).run_suite(&implementations, &workloads)
            }
        }
    })
    .await
    .map_err(|e| Error::other(format!("benchmark task failed: {}", e)))
}

/// Measure each implementation in its own worker process
async fn measure_isolated(
    command: WorkerCommand,
    implementations: &[Implementation],
    workload: &Workload,
    output: &OutputWriter,
) -> Result<Vec<BenchmarkRecord>> {
    let scratch = tempfile::tempdir()?;
    let mut records = Vec::new();

    // One at a time: concurrent workers would compete for the same cores
    for &implementation in implementations {
        let spinner = output.spinner(&format!("Benchmarking {}...", implementation));
        let worker = command.clone();
        let dir = scratch.path().to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || worker.run(implementation, &dir))
            .await
            .map_err(|e| Error::other(format!("worker task failed: {}", e)))?;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        match outcome {
            Ok(mut measured) => records.append(&mut measured),
            Err(e) => records.extend(workload.failed_records(implementation, &e.to_string())),
        }
    }
    Ok(records)
}

/// The child side of a full run: measure one implementation, write its records
async fn run_worker(
    name: &str,
    out: Option<&Path>,
    benchmarks: &[NamedBenchmark],
    inputs: &Inputs,
    driver_args: &[String],
) -> Result<()> {
    let implementation =
        Implementation::from_name(name).ok_or_else(|| Error::UnknownImplementation { name: name.to_string() })?;
    let out = out.ok_or_else(|| Error::invalid_args("--worker requires --worker-out"))?;

    let mut settings = DriverSettings::full();
    settings.apply_args(driver_args)?;

    let mut records = Vec::new();
    for (benchmark, operations) in benchmarks {
        let workload = inputs.load(benchmark, operations, &[implementation])?;
        info!(%implementation, benchmark = %benchmark, workload = %workload.describe(), "Worker measuring");
        records.extend(measure(vec![implementation], workload, settings.clone(), BenchmarkMode::Full).await?);
    }
    isolation::write_records(out, &records)?;
    Ok(())
}

/// Handle the bench command
#[instrument(skip_all, fields(names = ?args.names, smoke = args.smoke))]
pub async fn handle_bench(args: BenchArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("bench_command");

    let benchmarks = resolve_benchmarks(&args.names)?;
    let inputs = Inputs::resolve(&args, config)?;

    if let Some(worker) = &args.worker {
        return run_worker(worker, args.worker_out.as_deref(), &benchmarks, &inputs, &args.driver_args).await;
    }

    let implementations =
        select_implementations(&args.implementations, config.bench.implementations.as_deref())?;
    let mode = if args.smoke || config.bench.smoke {
        BenchmarkMode::Smoke
    } else {
        BenchmarkMode::Full
    };
    let mut settings = DriverSettings::for_mode(mode);
    config.bench.apply_to(&mut settings);
    settings.apply_args(&args.driver_args)?;
    info!(?settings, %mode, "Driver settings resolved");
    output.debug(&format!(
        "Driver: warm-up {:?}, measurement {:?}, {} samples, {} resamples",
        settings.warm_up, settings.measurement, settings.sample_size, settings.resamples
    ))?;

    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.paths.output_dir.clone());
    let mut failed = 0;

    for (name, operations) in &benchmarks {
        let workload = inputs.load(name, operations, &implementations)?;
        output.info(&format!(
            "Running benchmark '{}' ({} mode): {} implementation(s), {}",
            name,
            mode,
            implementations.len(),
            workload.describe()
        ))?;

        let records = match mode {
            BenchmarkMode::Smoke => {
                let spinner = output.spinner(&format!("Benchmarking {}...", name));
                let measured = measure(implementations.clone(), workload, settings.clone(), mode).await;
                if let Some(pb) = spinner {
                    pb.finish_and_clear();
                }
                measured?
            }
            BenchmarkMode::Full => {
                let command = WorkerCommand::current_exe(inputs.worker_leading(name), worker_trailing(&settings))?;
                measure_isolated(command, &implementations, &workload, output).await?
            }
        };

        let mut benchmark = BenchmarkReport::new(name.clone(), mode, records);
        if args.run_metadata {
            benchmark = benchmark.with_run_metadata(current_run_id(), Utc::now());
        }
        let written = report::write_benchmark_reports(&output_dir, &benchmark)?;

        for record in benchmark.records.iter().filter(|r| !r.is_ok()) {
            warn!(
                implementation = %record.implementation,
                fixture = %record.fixture,
                operation = %record.operation,
                error = record.message.as_deref().unwrap_or(""),
                "Benchmark failed"
            );
        }
        failed += benchmark.failed_count();

        output.benchmark_report(&benchmark)?;
        for path in &written {
            output.info(&format!("Wrote {}", path.display()))?;
        }
    }

    if failed > 0 {
        return Err(Error::BenchmarkFailed { failed });
    }
    output.success("✓ Benchmarks complete")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_settings_survive_the_worker_hop() {
        for settings in [DriverSettings::full(), DriverSettings::smoke()] {
            let mut parsed = DriverSettings::full();
            parsed.apply_args(&settings_to_args(&settings)).unwrap();
            assert_eq!(parsed, settings);
        }

        let custom = DriverSettings {
            warm_up: Duration::from_millis(250),
            measurement: Duration::from_secs(2),
            sample_size: 20,
            resamples: 5_000,
        };
        assert_eq!(
            settings_to_args(&custom),
            vec![
                "--warm-up-time",
                "0.25",
                "--measurement-time",
                "2",
                "--sample-size",
                "20",
                "--nresamples",
                "5000"
            ]
        );
    }

    #[test]
    fn test_resolve_benchmarks() {
        let resolved = resolve_benchmarks(&["Validate".to_string(), "validate".to_string()]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, "validate");
        assert_eq!(resolved[0].1, &[Operation::Compile, Operation::Validate]);

        let err = resolve_benchmarks(&["throughput".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownBenchmark { ref name } if name == "throughput"));
    }

    fn inputs() -> Inputs {
        Inputs {
            benchmarks_dir: PathBuf::from("benchmarks"),
            fixtures: vec!["people".to_string()],
            suite_dir: PathBuf::from("suite"),
            drafts: vec![SchemaDraft::Draft4, SchemaDraft::Draft2020_12],
            skip: Vec::new(),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_worker_leading_arguments() {
        assert_eq!(
            strings(inputs().worker_leading("serialize")),
            vec!["--quiet", "bench", "serialize", "--benchmarks-dir", "benchmarks", "--fixture", "people"]
        );
        assert_eq!(
            strings(inputs().worker_leading("suite")),
            vec![
                "--quiet",
                "bench",
                "suite",
                "--suite",
                "suite",
                "--draft",
                "draft4",
                "--draft",
                "draft2020-12"
            ]
        );
        assert_eq!(worker_trailing(&DriverSettings::smoke())[0], OsString::from("--"));
    }

    #[test]
    fn test_suite_workload_from_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("tests/draft7");
        std::fs::create_dir_all(&tests).unwrap();
        std::fs::write(dir.path().join("test-schema.json"), "{}").unwrap();
        std::fs::write(
            tests.join("type.json"),
            r#"[{"description": "integer", "schema": {"type": "integer"}, "tests": [
                {"description": "one", "data": 1, "valid": true},
                {"description": "text", "data": "a", "valid": false}
            ]}]"#,
        )
        .unwrap();

        let inputs = Inputs {
            suite_dir: dir.path().to_path_buf(),
            drafts: vec![SchemaDraft::Draft7],
            ..inputs()
        };
        let workload = inputs
            .load("suite", &[Operation::Validate], &[Implementation::Jsonschema])
            .unwrap();
        let Workload::Suite(workloads) = workload else {
            panic!("suite benchmark loaded fixtures");
        };
        assert_eq!(workloads.len(), 1);
        assert_eq!(workloads[0].cases.len(), 1);
        assert_eq!(workloads[0].name(), "suite-draft7");
    }
}
