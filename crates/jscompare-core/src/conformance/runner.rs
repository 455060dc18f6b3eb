//! Executes conformance cases against implementations
//!
//! One worker task per implementation; within a worker, cases run one at a
//! time on the blocking pool under a per-case timeout. A case that errors,
//! panics or hangs produces an `ERROR` verdict for that pair only.

use super::case::{ConformanceCase, ConformanceResult};
use crate::error::Error;
use crate::implementation::Implementation;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Default bound on a single compile + validate call
pub const DEFAULT_CASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Compiles and validates one case; `ConformanceRunner::execute` in production
type CaseRoutine = fn(Implementation, &ConformanceCase) -> ConformanceResult;

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub case_timeout: Duration,
    /// Run cases from the optional tier
    pub include_optional: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            case_timeout: DEFAULT_CASE_TIMEOUT,
            include_optional: true,
        }
    }
}

impl RunnerConfig {
    pub fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    pub fn with_optional(mut self, include: bool) -> Self {
        self.include_optional = include;
        self
    }
}

/// Progress callbacks, invoked from worker tasks
pub trait RunObserver: Send + Sync {
    fn implementation_started(&self, _implementation: Implementation, _cases: usize) {}
    fn case_finished(&self, _result: &ConformanceResult) {}
    fn implementation_finished(&self, _implementation: Implementation) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Runs every case against every configured implementation
pub struct ConformanceRunner {
    implementations: Vec<Implementation>,
    config: RunnerConfig,
}

impl ConformanceRunner {
    pub fn new(implementations: Vec<Implementation>, config: RunnerConfig) -> Self {
        Self {
            implementations,
            config,
        }
    }

    pub fn implementations(&self) -> &[Implementation] {
        &self.implementations
    }

    /// Verdict for a pair that never reaches the library, if any
    fn precheck(implementation: Implementation, case: &ConformanceCase) -> Option<ConformanceResult> {
        if !implementation.supports(case.draft) {
            return Some(ConformanceResult::skipped(
                implementation,
                case,
                format!("{} not supported", case.draft.display_name()),
            ));
        }
        case.known_failing
            .get(&implementation)
            .map(|reason| ConformanceResult::skipped(implementation, case, reason.clone()))
    }

    /// Compile and validate one case on the calling thread
    pub fn execute(implementation: Implementation, case: &ConformanceCase) -> ConformanceResult {
        if let Some(result) = Self::precheck(implementation, case) {
            return result;
        }

        let started = Instant::now();
        let outcome = implementation
            .compile(&case.schema, case.draft, &case.remotes)
            .and_then(|compiled| implementation.validate(&compiled, &case.instance));

        match outcome {
            Ok(outcome) => {
                ConformanceResult::decided(implementation, case, outcome.valid, started.elapsed())
            }
            Err(e) => ConformanceResult::errored(implementation, case, e.to_string(), started.elapsed()),
        }
    }

    /// Run all cases for one implementation, isolating each call
    async fn run_implementation(
        implementation: Implementation,
        cases: Arc<Vec<ConformanceCase>>,
        config: RunnerConfig,
        observer: Arc<dyn RunObserver>,
        routine: CaseRoutine,
    ) -> Vec<ConformanceResult> {
        let selected: Vec<usize> = (0..cases.len())
            .filter(|&i| config.include_optional || !cases[i].optional)
            .collect();
        observer.implementation_started(implementation, selected.len());
        info!(%implementation, cases = selected.len(), "Running conformance cases");

        let mut results = Vec::with_capacity(selected.len());
        for index in selected {
            let case = &cases[index];
            let result = match Self::precheck(implementation, case) {
                Some(skipped) => skipped,
                None => {
                    Self::execute_guarded(implementation, Arc::clone(&cases), index, config.case_timeout, routine)
                        .await
                }
            };

            debug!(
                %implementation,
                file = %result.file,
                case = %result.description,
                verdict = %result.verdict,
                "Case finished"
            );
            if let Some(detail) = result.detail.as_deref().filter(|_| result.verdict == super::Verdict::Error) {
                warn!(%implementation, file = %result.file, case = %result.description, error = detail, "Case errored");
            }

            observer.case_finished(&result);
            results.push(result);
        }

        observer.implementation_finished(implementation);
        results
    }

    /// Run one case on the blocking pool, converting panics and timeouts to `ERROR`
    async fn execute_guarded(
        implementation: Implementation,
        cases: Arc<Vec<ConformanceCase>>,
        index: usize,
        timeout: Duration,
        routine: CaseRoutine,
    ) -> ConformanceResult {
        let started = Instant::now();
        let worker_cases = Arc::clone(&cases);
        let handle = tokio::task::spawn_blocking(move || routine(implementation, &worker_cases[index]));

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => ConformanceResult::errored(
                implementation,
                &cases[index],
                format!("adapter panicked: {}", join_error),
                started.elapsed(),
            ),
            // The blocking thread cannot be cancelled; it is abandoned
            Err(_) => {
                let error = Error::Timeout {
                    implementation: implementation.short_name().to_string(),
                    millis: timeout.as_millis() as u64,
                };
                ConformanceResult::errored(implementation, &cases[index], error.to_string(), started.elapsed())
            }
        }
    }

    /// Run every case against every implementation, one worker per implementation
    ///
    /// Results come back grouped by implementation in registration order, and
    /// in corpus order within each implementation.
    #[instrument(skip_all, fields(cases = cases.len(), implementations = self.implementations.len()))]
    pub async fn run(
        &self,
        cases: Arc<Vec<ConformanceCase>>,
        observer: Arc<dyn RunObserver>,
    ) -> Vec<ConformanceResult> {
        let mut workers = JoinSet::new();
        for (position, &implementation) in self.implementations.iter().enumerate() {
            let cases = Arc::clone(&cases);
            let config = self.config.clone();
            let observer = Arc::clone(&observer);
            workers.spawn(async move {
                let results =
                    Self::run_implementation(implementation, cases, config, observer, Self::execute).await;
                (position, results)
            });
        }

        let mut per_implementation = Vec::with_capacity(self.implementations.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(done) => per_implementation.push(done),
                Err(e) => warn!(error = %e, "Conformance worker terminated abnormally"),
            }
        }

        per_implementation.sort_by_key(|(position, _)| *position);
        per_implementation
            .into_iter()
            .flat_map(|(_, results)| results)
            .collect()
    }
}
