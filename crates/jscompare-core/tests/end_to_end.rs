//! Whole-pipeline tests: cases through the runner into reports, fixtures
//! through the orchestrator into benchmark data

use jscompare_core::benchmark::{
    BenchmarkId, BenchmarkMode, BenchmarkOrchestrator, BenchmarkReport, FixtureInstance,
    RecordStatus, ThroughputStatistic, TimingDriver,
};
use jscompare_core::conformance::{ConformanceCase, ConformanceRunner, NoopObserver, RunnerConfig, Verdict};
use jscompare_core::report::{self, RunSummary};
use jscompare_core::{
    BenchmarkFixture, Implementation, RemoteSchemas, ResultsMatrix, Result, SchemaDraft, SkipPolicy,
    SkipRuleSpec, TestModel, DEFAULT_REMOTE_BASE,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn remotes() -> Arc<RemoteSchemas> {
    let mut remotes = RemoteSchemas::new(DEFAULT_REMOTE_BASE);
    remotes.insert("integer.json", json!({"type": "integer"}));
    Arc::new(remotes)
}

fn case(file: &str, description: &str, schema: &str, instance: &str, expected: bool) -> ConformanceCase {
    ConformanceCase {
        draft: SchemaDraft::Draft7,
        file: file.to_string(),
        group: "group".to_string(),
        description: description.to_string(),
        comment: None,
        schema: Arc::from(schema),
        instance: instance.to_string(),
        expected,
        optional: false,
        remotes: remotes(),
        known_failing: BTreeMap::new(),
    }
}

fn corpus() -> Vec<ConformanceCase> {
    vec![
        case("type.json", "integer is integer", r#"{"type":"integer"}"#, "1", true),
        case("type.json", "string is not integer", r#"{"type":"integer"}"#, r#""a""#, false),
        case(
            "refRemote.json",
            "remote ref valid",
            r#"{"$ref":"http://localhost:1234/integer.json"}"#,
            "1",
            true,
        ),
        case("broken.json", "malformed schema", r#"{"type":"#, "1", true),
    ]
}

#[tokio::test]
async fn test_conformance_pipeline() {
    let implementations = Implementation::all().to_vec();
    let mut cases = corpus();
    let configured = vec![SkipRuleSpec {
        implementation: Some("Valico".to_string()),
        case: Some("^string is not".to_string()),
        reason: "configured skip".to_string(),
        ..SkipRuleSpec::default()
    }];
    SkipPolicy::new(&implementations, &configured)
        .unwrap()
        .annotate(&implementations, &mut cases);

    let runner = ConformanceRunner::new(
        implementations.clone(),
        RunnerConfig::default().with_case_timeout(Duration::from_secs(30)),
    );
    let results = runner.run(Arc::new(cases), Arc::new(NoopObserver)).await;
    assert_eq!(results.len(), 12);

    let verdict = |imp: Implementation, description: &str| {
        results
            .iter()
            .find(|r| r.implementation == imp && r.description == description)
            .map(|r| r.verdict)
            .unwrap()
    };
    assert_eq!(verdict(Implementation::Jsonschema, "remote ref valid"), Verdict::Pass);
    assert_eq!(verdict(Implementation::Valico, "remote ref valid"), Verdict::Pass);
    assert_eq!(verdict(Implementation::JsonschemaValid, "remote ref valid"), Verdict::Skipped);
    assert_eq!(verdict(Implementation::Valico, "string is not integer"), Verdict::Skipped);
    for imp in &implementations {
        assert_eq!(verdict(*imp, "malformed schema"), Verdict::Error);
        assert_eq!(verdict(*imp, "integer is integer"), Verdict::Pass);
    }

    let matrix = ResultsMatrix::from_results(&results);
    assert_eq!(matrix.error_count(), 3);
    let valico = matrix.cell(Implementation::Valico, SchemaDraft::Draft7).unwrap();
    assert_eq!(valico.required.skipped, 1);
    assert_eq!(valico.required.applicable(), 3);

    let dir = tempfile::tempdir().unwrap();
    let summary = RunSummary::new(matrix, Duration::from_millis(10));
    report::write_conformance_reports(dir.path(), &summary).unwrap();
    let per_draft = std::fs::read_to_string(dir.path().join("per-draft.md")).unwrap();
    assert!(per_draft.contains("| refRemote.json |"));
}

/// Invokes each routine a few times and reports a fixed cost
struct CountingDriver {
    invocations: BTreeMap<String, usize>,
}

impl TimingDriver for CountingDriver {
    fn measure(&mut self, id: &BenchmarkId, routine: &mut dyn FnMut() -> Result<()>) -> Result<ThroughputStatistic> {
        for _ in 0..3 {
            routine()?;
        }
        *self
            .invocations
            .entry(format!("{}/{}", id.group, id.function))
            .or_default() += 3;
        Ok(ThroughputStatistic {
            mean_ns: 1_000.0,
            std_error_ns: 5.0,
            ci_lower_ns: 990.0,
            ci_upper_ns: 1_010.0,
            samples: 3,
        })
    }
}

#[test]
fn test_benchmark_pipeline() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["name", "decimal", "anEnum", "list", "polymorphicTypes"],
        "properties": {
            "name": {"type": "string"},
            "decimal": {"type": "number"},
            "anEnum": {"enum": ["THIS", "THAT", "OTHER"]},
            "list": {"type": "array", "items": {"type": "string"}},
            "polymorphicTypes": {"type": "array"}
        }
    });
    let instance = serde_json::to_string(&TestModel::sample()).unwrap();
    let fixture = BenchmarkFixture::new(
        "test-model-draft7",
        schema.to_string(),
        vec![FixtureInstance {
            name: "sample".to_string(),
            text: instance,
        }],
    )
    .unwrap();
    assert!(fixture.is_test_model());

    let driver = CountingDriver {
        invocations: BTreeMap::new(),
    };
    let mut orchestrator = BenchmarkOrchestrator::new(driver, BenchmarkMode::Smoke);
    let records = orchestrator.run(Implementation::all(), std::slice::from_ref(&fixture));
    assert_eq!(records.len(), 9);
    assert!(records.iter().all(|r| r.status == RecordStatus::Ok), "{:#?}", records);

    let driver = orchestrator.into_driver();
    assert_eq!(driver.invocations["test-model-draft7-validate/valico"], 3);

    let report = BenchmarkReport::new("validate", BenchmarkMode::Smoke, records);
    let dir = tempfile::tempdir().unwrap();
    let written = report::write_benchmark_reports(dir.path(), &report).unwrap();
    assert_eq!(written.len(), 2);
    let markdown = std::fs::read_to_string(dir.path().join("validate.md")).unwrap();
    assert!(markdown.contains("| JsonschemaValid | test-model-draft7 |"));
}
