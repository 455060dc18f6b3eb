//! Drives (implementation, fixture, operation) triples through a timing driver
//!
//! Each operation is pre-flighted once outside the driver. A pre-flight
//! failure, a routine error or a panic yields a `failed` record for that
//! triple and the run moves on to the next one.

use super::driver::{BenchmarkId, TimingDriver};
use super::fixture::BenchmarkFixture;
use super::record::{BenchmarkMode, BenchmarkRecord, Operation};
use super::workload::SuiteWorkload;
use crate::document::{same_document, DocumentModel, TestModel, TypedModel};
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::implementation::{CompiledSchema, Implementation};
use crate::remotes::RemoteSchemas;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn benchmark_error(implementation: Implementation, operation: Operation, message: impl Into<String>) -> Error {
    Error::Benchmark {
        implementation: implementation.short_name().to_string(),
        operation: operation.to_string(),
        message: message.into(),
    }
}

/// Run `f`, turning a panic into a benchmark error
fn guarded<T>(implementation: Implementation, operation: Operation, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => Err(benchmark_error(implementation, operation, "adapter panicked")),
    }
}

/// Serialize the model and validate the text, then validate and bind it again
fn typed_round_trip(
    implementation: Implementation,
    compiled: &CompiledSchema,
    model: &TestModel,
) -> Result<TestModel> {
    let text = TypedModel.to_text(model)?;
    let outbound = implementation.validate(compiled, &text)?;
    let inbound = implementation.validate(compiled, &text)?;
    if !outbound.valid || !inbound.valid {
        return Err(benchmark_error(
            implementation,
            Operation::Serialize,
            "schema rejected the serialized model",
        ));
    }
    TypedModel.to_native(&text)
}

/// What a record is about: a fixture or a corpus workload
struct Subject<'a> {
    name: &'a str,
    draft: SchemaDraft,
}

impl<'a> From<&'a BenchmarkFixture> for Subject<'a> {
    fn from(fixture: &'a BenchmarkFixture) -> Self {
        Subject {
            name: &fixture.name,
            draft: fixture.draft,
        }
    }
}

pub struct BenchmarkOrchestrator<D: TimingDriver> {
    driver: D,
    mode: BenchmarkMode,
    operations: Vec<Operation>,
}

impl<D: TimingDriver> BenchmarkOrchestrator<D> {
    pub fn new(driver: D, mode: BenchmarkMode) -> Self {
        Self {
            driver,
            mode,
            operations: Operation::ALL.to_vec(),
        }
    }

    /// Restrict the run to the given operations
    pub fn with_operations(mut self, operations: &[Operation]) -> Self {
        self.operations = operations.to_vec();
        self
    }

    pub fn mode(&self) -> BenchmarkMode {
        self.mode
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Records for every implementation × fixture × operation
    ///
    /// Pairs whose draft the implementation does not support produce no
    /// records at all.
    pub fn run(&mut self, implementations: &[Implementation], fixtures: &[BenchmarkFixture]) -> Vec<BenchmarkRecord> {
        let mut records = Vec::new();
        for &implementation in implementations {
            for fixture in fixtures {
                records.extend(self.run_fixture(implementation, fixture));
            }
        }
        records
    }

    #[instrument(skip_all, fields(implementation = %implementation, fixture = %fixture.name))]
    pub fn run_fixture(&mut self, implementation: Implementation, fixture: &BenchmarkFixture) -> Vec<BenchmarkRecord> {
        if !implementation.supports(fixture.draft) {
            info!(draft = %fixture.draft, "Draft not supported, no records");
            return Vec::new();
        }

        let operations = self.operations.clone();
        let wants = |op: Operation| operations.contains(&op);
        let remotes = Arc::new(RemoteSchemas::empty());
        let mut records = Vec::with_capacity(operations.len());

        if wants(Operation::Compile) || wants(Operation::Validate) {
            let compiled = guarded(implementation, Operation::Compile, || {
                implementation.compile(&fixture.schema, fixture.draft, &remotes)
            });
            match compiled {
                Ok(compiled) => {
                    if wants(Operation::Compile) {
                        records.push(self.measure_compile(implementation, fixture, &remotes));
                    }
                    if wants(Operation::Validate) {
                        records.push(self.measure_validate(implementation, fixture, &compiled));
                    }
                }
                Err(e) => {
                    let subject = Subject::from(fixture);
                    if wants(Operation::Compile) {
                        records.push(self.failed(implementation, &subject, Operation::Compile, e.to_string()));
                    }
                    if wants(Operation::Validate) {
                        records.push(self.failed(
                            implementation,
                            &subject,
                            Operation::Validate,
                            "schema did not compile",
                        ));
                    }
                }
            }
        }
        if wants(Operation::Serialize) {
            let record = if fixture.is_test_model() {
                self.measure_typed_serialize(implementation, fixture, &remotes)
            } else {
                self.measure_serialize(implementation, fixture)
            };
            records.push(record);
        }
        records
    }

    /// One validate record per supported (implementation, draft) corpus pass
    pub fn run_suite(&mut self, implementations: &[Implementation], workloads: &[SuiteWorkload]) -> Vec<BenchmarkRecord> {
        let mut records = Vec::new();
        for &implementation in implementations {
            for workload in workloads {
                if let Some(record) = self.run_workload(implementation, workload) {
                    records.push(record);
                }
            }
        }
        records
    }

    /// Time validating every prepared case of the workload once
    ///
    /// Cases are compiled up front. Cases marked known-failing for the
    /// implementation, and cases that fail to compile or validate in the
    /// pre-flight pass, are left out of the timed pass.
    #[instrument(skip_all, fields(implementation = %implementation, draft = %workload.draft))]
    pub fn run_workload(&mut self, implementation: Implementation, workload: &SuiteWorkload) -> Option<BenchmarkRecord> {
        if !implementation.supports(workload.draft) {
            info!("Draft not supported, no record");
            return None;
        }
        let name = workload.name();
        let subject = Subject {
            name: &name,
            draft: workload.draft,
        };

        let mut prepared = Vec::with_capacity(workload.cases.len());
        let mut excluded = 0usize;
        for case in &workload.cases {
            if case.known_failing.contains_key(&implementation) {
                excluded += 1;
                continue;
            }
            let ready = guarded(implementation, Operation::Validate, || {
                let compiled = implementation.compile(&case.schema, case.draft, &case.remotes)?;
                implementation.validate(&compiled, &case.instance)?;
                Ok(compiled)
            });
            match ready {
                Ok(compiled) => prepared.push((compiled, case.instance.as_str())),
                Err(e) => {
                    debug!(file = %case.file, case = %case.description, error = %e, "Case left out of suite pass");
                    excluded += 1;
                }
            }
        }
        if prepared.is_empty() {
            return Some(self.failed(implementation, &subject, Operation::Validate, "no corpus case could be prepared"));
        }
        info!(prepared = prepared.len(), excluded, "Suite pass prepared");

        let mut routine = || {
            for (compiled, instance) in &prepared {
                implementation.validate(compiled, instance)?;
            }
            Ok(())
        };
        Some(self.timed(implementation, &subject, Operation::Validate, &mut routine))
    }

    fn failed(
        &self,
        implementation: Implementation,
        subject: &Subject<'_>,
        operation: Operation,
        message: impl Into<String>,
    ) -> BenchmarkRecord {
        let message = message.into();
        warn!(%implementation, fixture = %subject.name, %operation, error = %message, "Benchmark failed");
        BenchmarkRecord::failed(implementation, subject.name, operation, subject.draft, self.mode, message)
    }

    /// Hand a pre-flighted routine to the driver and turn its answer into a record
    fn timed(
        &mut self,
        implementation: Implementation,
        subject: &Subject<'_>,
        operation: Operation,
        routine: &mut dyn FnMut() -> Result<()>,
    ) -> BenchmarkRecord {
        let id = BenchmarkId::new(
            &format!("{}-{}", subject.name, operation),
            implementation.short_name(),
        );
        let driver = &mut self.driver;
        let measured = guarded(implementation, operation, || driver.measure(&id, routine));

        match measured {
            Ok(stat) if stat.mean_ns.is_finite() && stat.mean_ns > 0.0 => {
                info!(%implementation, fixture = %subject.name, %operation, ops_per_sec = stat.ops_per_sec(), "Measured");
                BenchmarkRecord::measured(implementation, subject.name, operation, subject.draft, self.mode, stat)
            }
            Ok(stat) => self.failed(
                implementation,
                subject,
                operation,
                format!("driver reported unusable mean of {}ns", stat.mean_ns),
            ),
            Err(e) => self.failed(implementation, subject, operation, e.to_string()),
        }
    }

    fn measure_compile(
        &mut self,
        implementation: Implementation,
        fixture: &BenchmarkFixture,
        remotes: &Arc<RemoteSchemas>,
    ) -> BenchmarkRecord {
        let mut routine = || {
            implementation
                .compile(&fixture.schema, fixture.draft, remotes)
                .map(drop)
        };
        self.timed(implementation, &Subject::from(fixture), Operation::Compile, &mut routine)
    }

    /// Cycles over the instances that validate successfully
    fn measure_validate(
        &mut self,
        implementation: Implementation,
        fixture: &BenchmarkFixture,
        compiled: &CompiledSchema,
    ) -> BenchmarkRecord {
        let subject = Subject::from(fixture);
        let mut valid = Vec::with_capacity(fixture.instances.len());
        for instance in &fixture.instances {
            let outcome = guarded(implementation, Operation::Validate, || {
                implementation.validate(compiled, &instance.text)
            });
            match outcome {
                Ok(outcome) if outcome.valid => valid.push(instance.text.as_str()),
                Ok(_) => warn!(%implementation, instance = %instance.name, "Instance rejected, excluded from validate"),
                Err(e) => return self.failed(implementation, &subject, Operation::Validate, e.to_string()),
            }
        }
        if valid.is_empty() {
            return self.failed(
                implementation,
                &subject,
                Operation::Validate,
                "no instance is valid against the schema",
            );
        }

        let mut next = 0usize;
        let mut routine = || {
            let text = valid[next % valid.len()];
            next = next.wrapping_add(1);
            implementation.validate(compiled, text).map(drop)
        };
        self.timed(implementation, &subject, Operation::Validate, &mut routine)
    }

    /// Cycles over every instance, parsing and re-rendering it
    fn measure_serialize(&mut self, implementation: Implementation, fixture: &BenchmarkFixture) -> BenchmarkRecord {
        let subject = Subject::from(fixture);
        for instance in &fixture.instances {
            let preserved = guarded(implementation, Operation::Serialize, || {
                let back = implementation.round_trip(&instance.text)?;
                same_document(&instance.text, &back)
            });
            match preserved {
                Ok(true) => {}
                Ok(false) => {
                    return self.failed(
                        implementation,
                        &subject,
                        Operation::Serialize,
                        format!("round trip changed instance '{}'", instance.name),
                    )
                }
                Err(e) => return self.failed(implementation, &subject, Operation::Serialize, e.to_string()),
            }
        }

        let mut next = 0usize;
        let mut routine = || {
            let text = &fixture.instances[next % fixture.instances.len()].text;
            next = next.wrapping_add(1);
            implementation.round_trip(text).map(drop)
        };
        self.timed(implementation, &subject, Operation::Serialize, &mut routine)
    }

    /// Cycles over the typed models, validating on the way out and back in
    fn measure_typed_serialize(
        &mut self,
        implementation: Implementation,
        fixture: &BenchmarkFixture,
        remotes: &Arc<RemoteSchemas>,
    ) -> BenchmarkRecord {
        let subject = Subject::from(fixture);
        let prepared = guarded(implementation, Operation::Serialize, || {
            let compiled = implementation.compile(&fixture.schema, fixture.draft, remotes)?;
            let models = fixture
                .instances
                .iter()
                .map(|i| TypedModel.to_native(&i.text))
                .collect::<Result<Vec<_>>>()?;
            for model in &models {
                if typed_round_trip(implementation, &compiled, model)? != *model {
                    return Err(benchmark_error(implementation, Operation::Serialize, "typed round trip changed the model"));
                }
            }
            Ok((compiled, models))
        });
        let (compiled, models) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return self.failed(implementation, &subject, Operation::Serialize, e.to_string()),
        };

        let mut next = 0usize;
        let mut routine = || {
            let model = &models[next % models.len()];
            next = next.wrapping_add(1);
            typed_round_trip(implementation, &compiled, model).map(drop)
        };
        self.timed(implementation, &subject, Operation::Serialize, &mut routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::fixture::FixtureInstance;
    use crate::benchmark::record::{RecordStatus, ThroughputStatistic};
    use crate::conformance::ConformanceCase;
    use std::collections::BTreeMap;

    /// Calls the routine a fixed number of times and reports a constant mean
    struct FakeDriver {
        calls: usize,
        ids: Vec<BenchmarkId>,
    }

    impl FakeDriver {
        fn new() -> Self {
            Self { calls: 0, ids: Vec::new() }
        }
    }

    impl TimingDriver for FakeDriver {
        fn measure(&mut self, id: &BenchmarkId, routine: &mut dyn FnMut() -> Result<()>) -> Result<ThroughputStatistic> {
            self.ids.push(id.clone());
            for _ in 0..5 {
                routine()?;
                self.calls += 1;
            }
            Ok(ThroughputStatistic {
                mean_ns: 250.0,
                std_error_ns: 2.5,
                ci_lower_ns: 245.0,
                ci_upper_ns: 255.0,
                samples: 5,
            })
        }
    }

    fn fixture(schema: &str, instances: &[&str]) -> BenchmarkFixture {
        BenchmarkFixture::new(
            "person",
            schema.to_string(),
            instances
                .iter()
                .enumerate()
                .map(|(i, text)| FixtureInstance {
                    name: format!("i{}", i),
                    text: text.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    const SCHEMA: &str = r#"{
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["name"],
        "properties": {"name": {"type": "string"}}
    }"#;

    #[test]
    fn test_three_records_per_supported_pair() {
        let f = fixture(SCHEMA, &[r#"{"name":"a"}"#, r#"{"name":"b","x":1}"#]);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        let records = orchestrator.run(Implementation::all(), &[f]);

        assert_eq!(records.len(), 9);
        assert!(records.iter().all(|r| r.status == RecordStatus::Ok));
        assert!(records.iter().all(|r| r.ops_per_sec == Some(4e6)));

        let driver = orchestrator.into_driver();
        assert_eq!(driver.calls, 45);
        assert_eq!(driver.ids[0], BenchmarkId::new("person-compile", "Jsonschema"));
    }

    #[test]
    fn test_operation_filter() {
        let f = fixture(SCHEMA, &[r#"{"name":"a"}"#]);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke)
            .with_operations(&[Operation::Serialize]);
        let records = orchestrator.run_fixture(Implementation::Valico, &f);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, Operation::Serialize);
    }

    #[test]
    fn test_unsupported_draft_yields_no_records() {
        let f = fixture(
            r#"{"$schema":"https://json-schema.org/draft/2020-12/schema","type":"object"}"#,
            &["{}"],
        );
        assert_eq!(f.draft, SchemaDraft::Draft2020_12);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        assert!(orchestrator.run_fixture(Implementation::Valico, &f).is_empty());
        assert_eq!(orchestrator.run_fixture(Implementation::Jsonschema, &f).len(), 3);
    }

    #[test]
    fn test_invalid_schema_fails_compile_and_validate_only() {
        let f = fixture(
            r#"{"$schema":"http://json-schema.org/draft-07/schema#","type":12}"#,
            &["{}"],
        );
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        let records = orchestrator.run_fixture(Implementation::Jsonschema, &f);

        let statuses: Vec<_> = records.iter().map(|r| (r.operation, r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (Operation::Compile, RecordStatus::Failed),
                (Operation::Validate, RecordStatus::Failed),
                (Operation::Serialize, RecordStatus::Ok),
            ]
        );
        assert!(records[0].message.is_some());
    }

    #[test]
    fn test_no_valid_instance_fails_validate() {
        let f = fixture(SCHEMA, &[r#"{"name": 5}"#]);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        let records = orchestrator.run_fixture(Implementation::Jsonschema, &f);

        let validate = records.iter().find(|r| r.operation == Operation::Validate).unwrap();
        assert_eq!(validate.status, RecordStatus::Failed);
        assert_eq!(validate.message.as_deref(), Some("no instance is valid against the schema"));
    }

    #[test]
    fn test_unusable_statistic_is_failed_record() {
        struct ZeroDriver;
        impl TimingDriver for ZeroDriver {
            fn measure(&mut self, _: &BenchmarkId, routine: &mut dyn FnMut() -> Result<()>) -> Result<ThroughputStatistic> {
                routine()?;
                Ok(ThroughputStatistic {
                    mean_ns: 0.0,
                    std_error_ns: 0.0,
                    ci_lower_ns: 0.0,
                    ci_upper_ns: 0.0,
                    samples: 1,
                })
            }
        }

        let f = fixture(SCHEMA, &[r#"{"name":"a"}"#]);
        let mut orchestrator = BenchmarkOrchestrator::new(ZeroDriver, BenchmarkMode::Full);
        let records = orchestrator.run_fixture(Implementation::Valico, &f);
        assert!(records.iter().all(|r| r.status == RecordStatus::Failed));
        assert!(records.iter().all(|r| r.mode == BenchmarkMode::Full));
    }

    fn sample_text() -> String {
        serde_json::to_string(&TestModel::sample()).unwrap()
    }

    #[test]
    fn test_typed_serialize_validates_each_way() {
        let f = fixture(
            r#"{"$schema":"http://json-schema.org/draft-07/schema#","type":"object","required":["name","list"]}"#,
            &[&sample_text()],
        );
        assert!(f.is_test_model());
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke)
            .with_operations(&[Operation::Serialize]);
        let records = orchestrator.run(Implementation::all(), &[f]);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.status == RecordStatus::Ok), "{:?}", records);
        assert_eq!(orchestrator.into_driver().calls, 15);
    }

    #[test]
    fn test_typed_serialize_fails_when_schema_rejects_model() {
        let rejecting = r#"{"$schema":"http://json-schema.org/draft-07/schema#","properties":{"name":{"maxLength":3}}}"#;
        let typed = fixture(rejecting, &[&sample_text()]);
        let untyped = fixture(rejecting, &[r#"{"name":"far too long"}"#]);
        assert!(!untyped.is_test_model());

        for imp in Implementation::all() {
            let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke)
                .with_operations(&[Operation::Serialize]);
            let records = orchestrator.run_fixture(*imp, &typed);
            assert_eq!(records[0].status, RecordStatus::Failed, "{}", imp);
            assert!(records[0].message.as_deref().unwrap().contains("rejected"), "{}", imp);

            // Plain text round trips never consult the schema
            let records = orchestrator.run_fixture(*imp, &untyped);
            assert_eq!(records[0].status, RecordStatus::Ok, "{}", imp);
        }
    }

    #[test]
    fn test_typed_serialize_needs_a_compiling_schema() {
        let f = fixture(r#"{"$schema":"http://json-schema.org/draft-07/schema#","type":12}"#, &[&sample_text()]);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke)
            .with_operations(&[Operation::Serialize]);
        let records = orchestrator.run_fixture(Implementation::Jsonschema, &f);
        assert_eq!(records[0].status, RecordStatus::Failed);
        assert_eq!(orchestrator.into_driver().calls, 0);
    }

    #[test]
    fn test_smoke_and_full_share_record_identity() {
        let f = fixture(SCHEMA, &[r#"{"name":"a"}"#]);
        let mut smoke = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        let mut full = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Full);
        let smoke_records = smoke.run(Implementation::all(), std::slice::from_ref(&f));
        let full_records = full.run(Implementation::all(), std::slice::from_ref(&f));

        let smoke_ids: Vec<_> = smoke_records.iter().map(BenchmarkRecord::identity).collect();
        let full_ids: Vec<_> = full_records.iter().map(BenchmarkRecord::identity).collect();
        assert_eq!(smoke_ids, full_ids);
        assert!(smoke_records.iter().all(|r| r.mode == BenchmarkMode::Smoke));
        assert!(full_records.iter().all(|r| r.mode == BenchmarkMode::Full));
    }

    fn corpus_case(draft: SchemaDraft, schema: &str, instance: &str) -> ConformanceCase {
        ConformanceCase {
            draft,
            file: "type.json".to_string(),
            group: "types".to_string(),
            description: instance.to_string(),
            comment: None,
            schema: Arc::from(schema),
            instance: instance.to_string(),
            expected: true,
            optional: false,
            remotes: Arc::new(RemoteSchemas::empty()),
            known_failing: BTreeMap::new(),
        }
    }

    #[test]
    fn test_suite_pass_one_record_per_draft() {
        let mut skipped = corpus_case(SchemaDraft::Draft7, r#"{"type":"string"}"#, r#""x""#);
        skipped.known_failing.insert(Implementation::Valico, "slow".to_string());
        let cases = vec![
            corpus_case(SchemaDraft::Draft7, r#"{"type":"integer"}"#, "1"),
            corpus_case(SchemaDraft::Draft7, r#"{"type": "#, "1"),
            skipped,
            corpus_case(SchemaDraft::Draft2020_12, r#"{"type":"integer"}"#, "2"),
        ];
        let workloads = SuiteWorkload::from_cases(&cases);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Smoke);
        let records = orchestrator.run_suite(&[Implementation::Jsonschema, Implementation::Valico], &workloads);

        let ids: Vec<_> = records.iter().map(BenchmarkRecord::identity).collect();
        assert_eq!(
            ids,
            vec![
                (Implementation::Jsonschema, "suite-draft7", Operation::Validate, SchemaDraft::Draft7),
                (Implementation::Jsonschema, "suite-draft2020-12", Operation::Validate, SchemaDraft::Draft2020_12),
                (Implementation::Valico, "suite-draft7", Operation::Validate, SchemaDraft::Draft7),
            ]
        );
        assert!(records.iter().all(|r| r.status == RecordStatus::Ok));

        let driver = orchestrator.into_driver();
        assert_eq!(driver.calls, 15);
        assert_eq!(driver.ids[0], BenchmarkId::new("suite-draft7-validate", "Jsonschema"));
    }

    #[test]
    fn test_suite_pass_with_nothing_prepared_fails() {
        let workloads = SuiteWorkload::from_cases(&[corpus_case(SchemaDraft::Draft7, r#"{"type": "#, "1")]);
        let mut orchestrator = BenchmarkOrchestrator::new(FakeDriver::new(), BenchmarkMode::Full);
        let record = orchestrator
            .run_workload(Implementation::JsonschemaValid, &workloads[0])
            .unwrap();
        assert_eq!(record.status, RecordStatus::Failed);
        assert_eq!(record.message.as_deref(), Some("no corpus case could be prepared"));
    }
}
