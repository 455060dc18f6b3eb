//! Error types for the jscompare core library
//!
//! Errors fall into two groups. Case-level errors (schema compilation,
//! validation execution, timeouts) are attributed to a single
//! (case, implementation) pair and surface as `ERROR` verdicts. Everything
//! else is fatal for the run that raised it.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for jscompare operations
#[derive(Error, Debug)]
pub enum Error {
    /// The schema document is not a valid schema for the requested draft
    #[error("Schema compilation failed in {implementation}: {message}")]
    SchemaCompilation {
        implementation: String,
        message: String,
    },

    /// The adapter or wrapped library failed while validating an instance
    #[error("Validation execution failed in {implementation}: {message}")]
    ValidationExecution {
        implementation: String,
        message: String,
    },

    /// The external corpus or a benchmark fixture is missing or malformed
    #[error("Corpus load failed for {}: {message}", path.display())]
    CorpusLoad {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A single compile/validate call exceeded the per-case time limit
    #[error("{implementation} did not finish within {millis}ms")]
    Timeout { implementation: String, millis: u64 },

    /// A benchmark operation could not be measured
    #[error("Benchmark {operation} failed for {implementation}: {message}")]
    Benchmark {
        implementation: String,
        operation: String,
        message: String,
    },

    /// Invalid skip rules, driver flags or other configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Report data failed validation
    #[error("Report error: {message}")]
    Report { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn compilation(implementation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaCompilation {
            implementation: implementation.into(),
            message: message.into(),
        }
    }

    pub fn execution(implementation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationExecution {
            implementation: implementation.into(),
            message: message.into(),
        }
    }

    pub fn corpus(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorpusLoad {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Whether this error belongs to one (case, implementation) pair rather
    /// than to the run as a whole
    pub fn is_case_level(&self) -> bool {
        matches!(
            self,
            Self::SchemaCompilation { .. } | Self::ValidationExecution { .. } | Self::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
