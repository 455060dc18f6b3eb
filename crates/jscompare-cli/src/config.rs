//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables for the corpus and fixture directories
//!
//! Command-line arguments are applied on top by the handlers.

use crate::error::{Error, Result};
use jscompare_core::{DriverSettings, SkipRuleSpec, DEFAULT_CASE_TIMEOUT};
use jscompare_suite::SuiteConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where inputs are read from and reports written to
    pub paths: PathConfig,

    /// Conformance run settings
    pub functional: FunctionalConfig,

    /// Benchmark settings
    pub bench: BenchConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Path configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// JSON-Schema-Test-Suite checkout
    pub suite_dir: PathBuf,

    /// Bundled benchmark fixtures
    pub benchmarks_dir: PathBuf,

    /// Directory reports are written to
    pub output_dir: PathBuf,

    /// Previous functional-summary.json checked for regressions
    pub baseline: Option<PathBuf>,
}

/// Conformance run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalConfig {
    /// Per-case time limit
    pub case_timeout_ms: u64,

    /// Run the optional tier of the corpus
    pub include_optional: bool,

    /// Allow-list of implementation names
    pub implementations: Option<Vec<String>>,

    /// Extra known-failure rules
    pub skip: Vec<SkipRuleSpec>,
}

/// Benchmark configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Run in smoke mode unless overridden
    pub smoke: bool,

    pub warm_up_ms: Option<u64>,

    pub measurement_ms: Option<u64>,

    pub sample_size: Option<usize>,

    /// Allow-list of implementation names
    pub implementations: Option<Vec<String>>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        let suite = SuiteConfig::default();
        Self {
            suite_dir: suite.suite_dir,
            benchmarks_dir: suite.benchmarks_dir,
            output_dir: PathBuf::from("docs/_includes"),
            baseline: None,
        }
    }
}

impl Default for FunctionalConfig {
    fn default() -> Self {
        Self {
            case_timeout_ms: DEFAULT_CASE_TIMEOUT.as_millis() as u64,
            include_optional: true,
            implementations: None,
            skip: Vec::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            progress: true,
        }
    }
}

impl FunctionalConfig {
    pub fn case_timeout(&self) -> Duration {
        Duration::from_millis(self.case_timeout_ms)
    }
}

impl BenchConfig {
    /// Apply configured overrides to a driver's settings
    pub fn apply_to(&self, settings: &mut DriverSettings) {
        if let Some(ms) = self.warm_up_ms {
            settings.warm_up = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = self.measurement_ms {
            settings.measurement = Duration::from_millis(ms.max(1));
        }
        if let Some(n) = self.sample_size {
            settings.sample_size = n.max(10);
        }
    }
}

/// Serialization format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::of(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to load config");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = file {
            Self::from_file(path)?
        } else {
            Self::load()?
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override directories from `JSCOMPARE_SUITE_DIR` and `JSCOMPARE_BENCHMARKS_DIR`
    pub fn apply_env(&mut self) {
        let mut suite = self.suite_config();
        suite.apply_env();
        self.paths.suite_dir = suite.suite_dir;
        self.paths.benchmarks_dir = suite.benchmarks_dir;
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.functional.case_timeout_ms == 0 {
            return Err(Error::config("functional.case_timeout_ms must be positive"));
        }
        for rule in &self.functional.skip {
            if rule.reason.trim().is_empty() {
                return Err(Error::config("every skip rule needs a reason"));
            }
        }
        Ok(())
    }

    pub fn suite_config(&self) -> SuiteConfig {
        SuiteConfig {
            suite_dir: self.paths.suite_dir.clone(),
            benchmarks_dir: self.paths.benchmarks_dir.clone(),
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        for stem in [".jscompare", "jscompare"] {
            for ext in ["yaml", "json", "toml"] {
                paths.push(PathBuf::from(format!("{}.{}", stem, ext)));
            }
        }

        // User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let dir = config_dir.join("jscompare");
            for ext in ["yaml", "json", "toml"] {
                paths.push(dir.join(format!("config.{}", ext)));
            }
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jscompare_core::SchemaDraft;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Programmatic construction for tests
    struct ConfigBuilder {
        config: Config,
    }

    impl ConfigBuilder {
        fn new() -> Self {
            Self {
                config: Config::default(),
            }
        }

        fn suite_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.config.paths.suite_dir = dir.into();
            self
        }

        fn benchmarks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.config.paths.benchmarks_dir = dir.into();
            self
        }

        fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.config.paths.output_dir = dir.into();
            self
        }

        fn baseline(mut self, path: impl Into<PathBuf>) -> Self {
            self.config.paths.baseline = Some(path.into());
            self
        }

        fn case_timeout_ms(mut self, ms: u64) -> Self {
            self.config.functional.case_timeout_ms = ms;
            self
        }

        /// Add a known-failure rule
        fn skip_rule(mut self, rule: SkipRuleSpec) -> Self {
            self.config.functional.skip.push(rule);
            self
        }

        fn smoke(mut self, smoke: bool) -> Self {
            self.config.bench.smoke = smoke;
            self
        }

        fn build(self) -> Config {
            self.config
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.suite_dir, PathBuf::from("JSON-Schema-Test-Suite"));
        assert_eq!(config.paths.output_dir, PathBuf::from("docs/_includes"));
        assert_eq!(config.functional.case_timeout_ms, 5000);
        assert!(config.functional.include_optional);
        assert!(!config.bench.smoke);
    }

    #[test]
    fn test_yaml_partial_sections_keep_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jscompare.yaml");
        std::fs::write(
            &path,
            "functional:\n  case_timeout_ms: 250\n  skip:\n    - implementation: Valico\n      draft: draft4\n      file: '^ref\\.json$'\n      reason: recursion\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.functional.case_timeout_ms, 250);
        assert!(config.functional.include_optional);
        assert_eq!(config.functional.skip.len(), 1);
        assert_eq!(config.functional.skip[0].draft, Some(SchemaDraft::Draft4));
        assert_eq!(config.paths, PathConfig::default());
    }

    #[test]
    fn test_toml_and_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .suite_dir("/suite")
            .benchmarks_dir("/fixtures")
            .output_dir("/out")
            .baseline("/baseline.json")
            .smoke(true)
            .build();

        let written = [
            ("config.toml", toml::to_string_pretty(&config).unwrap()),
            ("config.json", serde_json::to_string_pretty(&config).unwrap()),
            ("config.yml", serde_yaml::to_string(&config).unwrap()),
        ];
        for (name, content) in written {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config, "{}", name);
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Config::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_rejects_reasonless_rules() {
        let config = ConfigBuilder::new()
            .skip_rule(SkipRuleSpec {
                implementation: Some("Valico".into()),
                ..SkipRuleSpec::default()
            })
            .build();
        assert!(config.validate().is_err());
        assert!(ConfigBuilder::new().case_timeout_ms(0).build().validate().is_err());
    }

    #[test]
    fn test_bench_overrides_settings() {
        let mut settings = DriverSettings::smoke();
        BenchConfig {
            warm_up_ms: Some(20),
            sample_size: Some(3),
            ..BenchConfig::default()
        }
        .apply_to(&mut settings);
        assert_eq!(settings.warm_up, Duration::from_millis(20));
        assert_eq!(settings.sample_size, 10);
        assert_eq!(settings.measurement, DriverSettings::smoke().measurement);
    }
}
