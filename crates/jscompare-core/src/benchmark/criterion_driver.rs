//! [`TimingDriver`] backed by criterion
//!
//! Criterion owns warm-up, sampling and bootstrap analysis. After each
//! measurement the driver reads the mean estimate criterion writes to
//! `<output>/<group>/<function>/new/estimates.json`.

use super::driver::{BenchmarkId, DriverSettings, TimingDriver};
use super::record::ThroughputStatistic;
use crate::error::{Error, Result};
use criterion::{black_box, Criterion};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Debug, Deserialize)]
struct Estimate {
    point_estimate: f64,
    standard_error: f64,
    confidence_interval: ConfidenceInterval,
}

#[derive(Debug, Deserialize)]
struct ConfidenceInterval {
    lower_bound: f64,
    upper_bound: f64,
}

pub struct CriterionDriver {
    criterion: Criterion,
    output_dir: PathBuf,
    settings: DriverSettings,
}

impl CriterionDriver {
    pub fn new(output_dir: impl Into<PathBuf>, settings: DriverSettings) -> Self {
        let output_dir = output_dir.into();
        let criterion = Criterion::default()
            .output_directory(&output_dir)
            .without_plots();
        Self {
            criterion,
            output_dir,
            settings,
        }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    fn estimates_path(&self, id: &BenchmarkId) -> PathBuf {
        self.output_dir
            .join(&id.group)
            .join(&id.function)
            .join("new")
            .join("estimates.json")
    }
}

/// Parse criterion's estimates file into a statistic
pub(crate) fn read_estimates(path: &Path, samples: u64) -> Result<ThroughputStatistic> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
        message: format!("reading {}", path.display()),
        source: e,
    })?;
    let estimates: Estimates = serde_json::from_str(&text)?;
    let mean = estimates.mean;
    Ok(ThroughputStatistic {
        mean_ns: mean.point_estimate,
        std_error_ns: mean.standard_error,
        ci_lower_ns: mean.confidence_interval.lower_bound,
        ci_upper_ns: mean.confidence_interval.upper_bound,
        samples,
    })
}

impl TimingDriver for CriterionDriver {
    fn measure(
        &mut self,
        id: &BenchmarkId,
        routine: &mut dyn FnMut() -> Result<()>,
    ) -> Result<ThroughputStatistic> {
        let mut failure: Option<Error> = None;
        {
            let mut group = self.criterion.benchmark_group(id.group.as_str());
            group
                .sample_size(self.settings.sample_size)
                .warm_up_time(self.settings.warm_up)
                .measurement_time(self.settings.measurement)
                .nresamples(self.settings.resamples);
            group.bench_function(id.function.as_str(), |b| {
                b.iter(|| {
                    if let Err(e) = black_box(routine()) {
                        failure.get_or_insert(e);
                    }
                })
            });
            group.finish();
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let path = self.estimates_path(id);
        debug!(path = %path.display(), "Reading criterion estimates");
        read_estimates(&path, self.settings.sample_size as u64)
    }
}
