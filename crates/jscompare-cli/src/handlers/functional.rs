//! Functional (conformance) command handler

use super::{parse_drafts, select_implementations};
use crate::cli::FunctionalArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use jscompare_core::report::{self, conformance};
use jscompare_core::{
    ConformanceResult, ConformanceRunner, NoopObserver, ResultsMatrix, RunObserver, RunSummary,
    RunnerConfig, SkipPolicy, Verdict,
};
use jscompare_suite::CorpusLoader;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Most ERROR verdicts listed individually in human output
const LISTED_ERRORS: usize = 20;

/// Read a previously written summary to compare against
fn load_baseline(path: &Path) -> Result<ResultsMatrix> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    Ok(conformance::read_summary_json(&text)?.results)
}

fn report_errors(output: &mut OutputWriter, results: &[ConformanceResult]) -> Result<()> {
    let errors: Vec<_> = results.iter().filter(|r| r.verdict == Verdict::Error).collect();
    for result in &errors {
        warn!(
            implementation = %result.implementation,
            draft = %result.draft,
            file = %result.file,
            case = %result.description,
            error = result.detail.as_deref().unwrap_or(""),
            "Case ended in ERROR"
        );
    }

    if errors.is_empty() {
        return Ok(());
    }
    output.section("Errors")?;
    for result in errors.iter().take(LISTED_ERRORS) {
        output.error(&format!(
            "✗ {} {}/{}: {} ({})",
            result.implementation,
            result.draft,
            result.file,
            result.description,
            result.detail.as_deref().unwrap_or("no detail")
        ))?;
    }
    if errors.len() > LISTED_ERRORS {
        output.error(&format!("… and {} more", errors.len() - LISTED_ERRORS))?;
    }
    Ok(())
}

/// Handle the functional command
#[instrument(skip_all, fields(suite = tracing::field::Empty))]
pub async fn handle_functional(
    args: FunctionalArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::new("functional_command");

    let suite_dir = args.suite.clone().unwrap_or_else(|| config.paths.suite_dir.clone());
    tracing::Span::current().record("suite", tracing::field::display(suite_dir.display()));
    let implementations =
        select_implementations(&args.implementations, config.functional.implementations.as_deref())?;
    let drafts = parse_drafts(&args.drafts)?;

    // Read the baseline first: it may be the summary this run overwrites
    let baseline_path = args.baseline.clone().or_else(|| config.paths.baseline.clone());
    let baseline = baseline_path.as_deref().map(load_baseline).transpose()?;

    output.info(&format!("Loading conformance corpus from {}", suite_dir.display()))?;
    let spinner = output.spinner("Loading conformance corpus...");
    let loaded = {
        let _load_timer = Timer::with_details("corpus_loading", &suite_dir.display().to_string());
        CorpusLoader::new(&suite_dir).load(&drafts)
    };
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let mut corpus = loaded?;

    if args.stats && output.is_human() {
        corpus.statistics().print();
    }

    let policy = SkipPolicy::new(&implementations, &config.functional.skip)?;
    policy.annotate(&implementations, &mut corpus.cases);
    info!(
        cases = corpus.cases.len(),
        rules = policy.len(),
        implementations = implementations.len(),
        "Corpus ready"
    );

    let timeout = args
        .case_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.functional.case_timeout());
    let runner_config = RunnerConfig::default()
        .with_case_timeout(timeout)
        .with_optional(config.functional.include_optional && !args.no_optional);
    let runner = ConformanceRunner::new(implementations, runner_config);

    let observer: Arc<dyn RunObserver> = match output.progress_observer() {
        Some(progress) if config.output.progress => Arc::new(progress),
        _ => Arc::new(NoopObserver),
    };

    let started = Instant::now();
    let results = runner.run(Arc::new(corpus.cases), observer).await;
    let summary = RunSummary::new(ResultsMatrix::from_results(&results), started.elapsed());

    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.paths.output_dir.clone());
    let written = report::write_conformance_reports(&output_dir, &summary)?;

    output.summary(&summary)?;
    for path in &written {
        output.info(&format!("Wrote {}", path.display()))?;
    }
    report_errors(output, &results)?;

    if let Some(baseline) = baseline {
        let regressions = summary.results.regressions_against(&baseline);
        if !regressions.is_empty() {
            output.section("Regressions")?;
            output.regressions(&regressions)?;
            return Err(Error::Regression {
                count: regressions.len(),
            });
        }
        output.success("✓ No regressions against the baseline")?;
    }

    let error_count = summary.results.error_count();
    if error_count > 0 {
        return Err(Error::ErrorVerdicts { count: error_count });
    }

    output.success("✓ Conformance run complete")?;
    Ok(())
}
