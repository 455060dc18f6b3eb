//! End-to-end tests of the `jscompare` binary

use assert_cmd::Command;
use jscompare_core::report::benchmark::read_report;
use jscompare_core::{BenchmarkMode, Operation, RecordStatus};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PASSING_CASES: &str = r#"[
    {
        "description": "integer type matches integers",
        "schema": {"type": "integer"},
        "tests": [
            {"description": "an integer is an integer", "data": 1, "valid": true},
            {"description": "a string is not an integer", "data": "foo", "valid": false}
        ]
    }
]"#;

/// Same cases plus one whose expectation is wrong, so every validator fails it
const WITH_WRONG_EXPECTATION: &str = r#"[
    {
        "description": "integer type matches integers",
        "schema": {"type": "integer"},
        "tests": [
            {"description": "an integer is an integer", "data": 1, "valid": true},
            {"description": "a string is not an integer", "data": "foo", "valid": false},
            {"description": "a float claimed to be an integer", "data": 1.5, "valid": true}
        ]
    }
]"#;

/// The binary, isolated from config files and environment overrides
fn jscompare(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jscompare").unwrap();
    cmd.current_dir(cwd)
        .env_remove("JSCOMPARE_CONFIG")
        .env_remove("JSCOMPARE_SUITE_DIR")
        .env_remove("JSCOMPARE_BENCHMARKS_DIR")
        .env_remove("JSCOMPARE_LOG_FILE")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn bundled_benchmarks() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../benchmarks")
}

fn write_suite(root: &Path, type_cases: &str) -> PathBuf {
    let suite = root.join("suite");
    fs::create_dir_all(suite.join("tests/draft7")).unwrap();
    fs::write(suite.join("test-schema.json"), "{}").unwrap();
    fs::write(suite.join("tests/draft7/type.json"), type_cases).unwrap();
    suite
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn implementations_writes_listing() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["implementations", "--output-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jsonschema"));

    let listing = read_json(&dir.path().join("out/implementations.json"));
    assert_eq!(listing.as_array().unwrap().len(), 3);
}

#[test]
fn implementations_print_emits_json_only() {
    let dir = TempDir::new().unwrap();
    let assert = jscompare(dir.path())
        .args(["-o", "json", "implementations", "--print"])
        .assert()
        .success();

    let listing: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 3);
    assert!(!dir.path().join("docs").exists());
}

#[test]
fn functional_writes_reports() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(dir.path(), PASSING_CASES);

    jscompare(dir.path())
        .arg("functional")
        .arg(&suite)
        .args(["-d", "draft7", "-i", "jsonschema", "--output-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Conformance Summary"));

    let out = dir.path().join("out");
    assert!(out.join("functional-summary.md").is_file());
    assert!(out.join("per-draft.md").is_file());
    let summary = read_json(&out.join("functional-summary.json"));
    assert_eq!(summary["results"]["Jsonschema"]["draft7"]["required"]["pass"], 2);
}

#[test]
fn functional_detects_regression_against_baseline() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(dir.path(), PASSING_CASES);
    let args = ["-d", "draft7", "-i", "jsonschema", "--output-dir", "out"];

    jscompare(dir.path())
        .arg("functional")
        .arg(&suite)
        .args(args)
        .assert()
        .success();
    fs::copy(
        dir.path().join("out/functional-summary.json"),
        dir.path().join("baseline.json"),
    )
    .unwrap();

    fs::write(suite.join("tests/draft7/type.json"), WITH_WRONG_EXPECTATION).unwrap();
    jscompare(dir.path())
        .arg("functional")
        .arg(&suite)
        .args(args)
        .args(["--baseline", "baseline.json"])
        .assert()
        .code(21);

    let summary = read_json(&dir.path().join("out/functional-summary.json"));
    assert_eq!(summary["results"]["Jsonschema"]["draft7"]["required"]["fail"], 1);
}

#[test]
fn functional_missing_corpus() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["functional", "no-such-suite"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn functional_unknown_implementation() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["functional", "-i", "ajv"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("ajv"));
}

#[test]
fn bench_unknown_benchmark() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["bench", "throughput"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("throughput"));
}

#[test]
fn bench_smoke_runs_in_process() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["bench", "validate", "--smoke", "-i", "jsonschema", "-f", "test-model-draft7"])
        .arg("--benchmarks-dir")
        .arg(bundled_benchmarks())
        .args(["--output-dir", "out", "--", "--measurement-time", "0.05"])
        .assert()
        .success();

    let out = dir.path().join("out");
    let report = read_report(&fs::read_to_string(out.join("validate.json")).unwrap()).unwrap();
    assert_eq!(report.mode, BenchmarkMode::Smoke);
    assert_eq!(report.run_id, None);
    let operations: Vec<_> = report.records.iter().map(|r| r.operation).collect();
    assert_eq!(operations, vec![Operation::Compile, Operation::Validate]);
    assert!(report.records.iter().all(|r| r.status == RecordStatus::Ok));
    assert!(out.join("validate.md").is_file());
    assert!(!out.join("benchmark_results.csv").exists());
}

#[test]
fn bench_full_isolates_workers() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["bench", "serialize", "-i", "jsonschema", "-f", "test-model-draft7", "--run-metadata"])
        .arg("--benchmarks-dir")
        .arg(bundled_benchmarks())
        .args(["--output-dir", "out", "--"])
        .args(["--warm-up-time", "0.01", "--measurement-time", "0.05"])
        .args(["--sample-size", "10", "--nresamples", "100"])
        .assert()
        .success();

    let out = dir.path().join("out");
    let report = read_report(&fs::read_to_string(out.join("serialize.json")).unwrap()).unwrap();
    assert_eq!(report.mode, BenchmarkMode::Full);
    assert!(report.run_id.as_deref().is_some_and(|id| id.starts_with("run_")));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].status, RecordStatus::Ok);
    assert_eq!(report.records[0].mode, BenchmarkMode::Full);
    assert!(out.join("benchmark_results.csv").is_file());
}

#[test]
fn bench_suite_times_corpus_passes() {
    let dir = TempDir::new().unwrap();
    let suite = write_suite(dir.path(), PASSING_CASES);
    jscompare(dir.path())
        .args(["bench", "suite", "--smoke", "-i", "jsonschema", "-i", "valico", "-d", "draft7"])
        .arg("--suite")
        .arg(&suite)
        .args(["--output-dir", "out", "--", "--measurement-time", "0.05"])
        .assert()
        .success();

    let report = read_report(&fs::read_to_string(dir.path().join("out/suite.json")).unwrap()).unwrap();
    let fixtures: Vec<_> = report.records.iter().map(|r| r.fixture.as_str()).collect();
    assert_eq!(fixtures, vec!["suite-draft7", "suite-draft7"]);
    assert!(report
        .records
        .iter()
        .all(|r| r.operation == Operation::Validate && r.status == RecordStatus::Ok));
}

#[test]
fn completions_generate() {
    let dir = TempDir::new().unwrap();
    jscompare(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jscompare"));
}
