//! Corpus loaders for jscompare
//!
//! Reads the external JSON-Schema-Test-Suite checkout into conformance cases
//! and the bundled `benchmarks/` directory into benchmark fixtures.

pub mod corpus;
pub mod fixtures;

use std::path::PathBuf;
use thiserror::Error;

pub use corpus::{Corpus, CorpusLoader, CorpusStatistics};
pub use fixtures::FixtureLoader;

/// File whose presence marks a JSON-Schema-Test-Suite checkout
pub const SUITE_MARKER: &str = "test-schema.json";

/// Loader error types
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "JSON-Schema-Test-Suite not found at {}: clone https://github.com/json-schema-org/JSON-Schema-Test-Suite there first",
        path.display()
    )]
    MissingCorpus { path: PathBuf },

    #[error("Malformed corpus file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Benchmark fixture '{name}': {message}")]
    Fixture { name: String, message: String },
}

impl SuiteError {
    /// The file or directory the error concerns
    pub fn path(&self) -> PathBuf {
        match self {
            SuiteError::Io { path, .. }
            | SuiteError::Json { path, .. }
            | SuiteError::MissingCorpus { path }
            | SuiteError::Malformed { path, .. } => path.clone(),
            SuiteError::Fixture { name, .. } => PathBuf::from(name),
        }
    }
}

impl From<SuiteError> for jscompare_core::Error {
    fn from(e: SuiteError) -> Self {
        jscompare_core::Error::CorpusLoad {
            path: e.path(),
            message: e.to_string(),
            source: Some(anyhow::Error::new(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteError>;

/// Where the loaders look by default
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub suite_dir: PathBuf,
    pub benchmarks_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            suite_dir: PathBuf::from("JSON-Schema-Test-Suite"),
            benchmarks_dir: PathBuf::from("benchmarks"),
        }
    }
}

/// Overrides the suite checkout location
pub const SUITE_DIR_ENV: &str = "JSCOMPARE_SUITE_DIR";
/// Overrides the benchmark fixture directory
pub const BENCHMARKS_DIR_ENV: &str = "JSCOMPARE_BENCHMARKS_DIR";

impl SuiteConfig {
    /// Override paths from `JSCOMPARE_SUITE_DIR` and `JSCOMPARE_BENCHMARKS_DIR` when set
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(SUITE_DIR_ENV) {
            self.suite_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var(BENCHMARKS_DIR_ENV) {
            self.benchmarks_dir = PathBuf::from(dir);
        }
    }

    pub fn corpus_loader(&self) -> CorpusLoader {
        CorpusLoader::new(&self.suite_dir)
    }

    pub fn fixture_loader(&self) -> FixtureLoader {
        FixtureLoader::new(&self.benchmarks_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_corpus_message_mentions_clone() {
        let err = SuiteError::MissingCorpus {
            path: PathBuf::from("/nowhere"),
        };
        assert!(err.to_string().contains("clone"));

        let core: jscompare_core::Error = err.into();
        assert!(matches!(core, jscompare_core::Error::CorpusLoad { ref path, .. } if path == &PathBuf::from("/nowhere")));
    }

    #[test]
    fn test_config_defaults() {
        let config = SuiteConfig::default();
        assert_eq!(config.suite_dir, PathBuf::from("JSON-Schema-Test-Suite"));
        assert_eq!(config.benchmarks_dir, PathBuf::from("benchmarks"));
    }
}
