//! The timing driver seam
//!
//! Statistical timing (warm-up, sampling, outlier analysis) belongs to an
//! external engine. The orchestrator only hands it a named routine and reads
//! back a [`ThroughputStatistic`].

use super::record::{BenchmarkMode, ThroughputStatistic};
use crate::error::{Error, Result};
use std::time::Duration;

/// Longest identifier segment the driver writes to disk
const MAX_ID_LEN: usize = 64;

/// Restrict an identifier to `[a-z0-9_-]` so it maps 1:1 onto a directory name
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .take(MAX_ID_LEN)
        .collect()
}

/// Name of one measured routine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BenchmarkId {
    pub group: String,
    pub function: String,
}

impl BenchmarkId {
    pub fn new(group: &str, function: &str) -> Self {
        Self {
            group: sanitize_id(group),
            function: sanitize_id(function),
        }
    }
}

/// Settings forwarded to the timing driver
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub warm_up: Duration,
    pub measurement: Duration,
    pub sample_size: usize,
    pub resamples: usize,
}

impl DriverSettings {
    pub fn full() -> Self {
        Self {
            warm_up: Duration::from_secs(3),
            measurement: Duration::from_secs(5),
            sample_size: 100,
            resamples: 100_000,
        }
    }

    pub fn smoke() -> Self {
        Self {
            warm_up: Duration::from_millis(1),
            measurement: Duration::from_millis(100),
            sample_size: 10,
            resamples: 1_000,
        }
    }

    pub fn for_mode(mode: BenchmarkMode) -> Self {
        match mode {
            BenchmarkMode::Full => Self::full(),
            BenchmarkMode::Smoke => Self::smoke(),
        }
    }

    /// Apply pass-through flags: `--warm-up-time`, `--measurement-time`
    /// (seconds), `--sample-size`, `--nresamples`, as `--flag value` or
    /// `--flag=value`
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            let value = match inline {
                Some(v) => v,
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| Error::configuration(format!("{} requires a value", flag)))?,
            };

            match flag {
                "--warm-up-time" => self.warm_up = parse_seconds(flag, &value)?,
                "--measurement-time" => self.measurement = parse_seconds(flag, &value)?,
                "--sample-size" => self.sample_size = parse_count(flag, &value)?.max(10),
                "--nresamples" => self.resamples = parse_count(flag, &value)?,
                other => {
                    return Err(Error::configuration(format!(
                        "unknown timing driver flag '{}'",
                        other
                    )))
                }
            }
        }
        Ok(())
    }
}

fn parse_seconds(flag: &str, value: &str) -> Result<Duration> {
    value
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| Error::configuration(format!("{} expects positive seconds, got '{}'", flag, value)))
}

fn parse_count(flag: &str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::configuration(format!("{} expects a positive integer, got '{}'", flag, value)))
}

/// Black-box statistical timing engine
pub trait TimingDriver {
    /// Repeatedly invoke `routine` and summarise its cost
    ///
    /// An error returned by the routine aborts the measurement and is
    /// returned unchanged.
    fn measure(
        &mut self,
        id: &BenchmarkId,
        routine: &mut dyn FnMut() -> Result<()>,
    ) -> Result<ThroughputStatistic>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Test Model/Draft 7"), "test_model_draft_7");
        assert_eq!(sanitize_id("jsonschema-valid_2"), "jsonschema-valid_2");
        assert_eq!(sanitize_id(&"x".repeat(100)).len(), 64);
    }

    #[test]
    fn test_apply_args() {
        let mut settings = DriverSettings::full();
        settings
            .apply_args(&args(&["--warm-up-time", "0.5", "--sample-size=20", "--measurement-time", "2"]))
            .unwrap();
        assert_eq!(settings.warm_up, Duration::from_millis(500));
        assert_eq!(settings.measurement, Duration::from_secs(2));
        assert_eq!(settings.sample_size, 20);
    }

    #[test]
    fn test_sample_size_floor() {
        let mut settings = DriverSettings::smoke();
        settings.apply_args(&args(&["--sample-size", "3"])).unwrap();
        assert_eq!(settings.sample_size, 10);
    }

    #[test]
    fn test_apply_args_rejects_bad_input() {
        let mut settings = DriverSettings::smoke();
        assert!(settings.apply_args(&args(&["--forks", "1"])).is_err());
        assert!(settings.apply_args(&args(&["--warm-up-time"])).is_err());
        assert!(settings.apply_args(&args(&["--warm-up-time", "-1"])).is_err());
        assert!(settings.apply_args(&args(&["--sample-size", "many"])).is_err());
    }
}
