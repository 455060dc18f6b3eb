//! Error types and handling for the CLI
//!
//! Every error maps to a process exit code. The conformance and benchmark
//! outcome codes (20-22) are reported after all reports have been written.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from jscompare-core
    #[error("{0}")]
    Core(#[from] jscompare_core::Error),

    /// Error while reading the corpus or fixtures
    #[error("{0}")]
    Suite(#[from] jscompare_suite::SuiteError),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Unknown implementation '{name}'")]
    UnknownImplementation { name: String },

    #[error("Unknown benchmark '{name}' (expected validate, serialize, all or suite)")]
    UnknownBenchmark { name: String },

    /// At least one case ended in an `ERROR` verdict
    #[error("{count} case(s) ended in an ERROR verdict")]
    ErrorVerdicts { count: u64 },

    /// Failures grew compared with the baseline run
    #[error("{count} draft/implementation cell(s) regressed against the baseline")]
    Regression { count: usize },

    /// At least one benchmark record could not be measured
    #[error("{failed} benchmark record(s) failed")]
    BenchmarkFailed { failed: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::UnknownImplementation { .. } => 7,
            Self::UnknownBenchmark { .. } => 8,
            Self::Suite(_) => 9,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Toml(_) | Self::TomlSer(_) => 14,
            Self::ErrorVerdicts { .. } => 20,
            Self::Regression { .. } => 21,
            Self::BenchmarkFailed { .. } => 22,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgs(_) | Self::UnknownImplementation { .. } | Self::UnknownBenchmark { .. }
        )
    }

    /// Whether the run itself completed and the error only reports its outcome
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::ErrorVerdicts { .. } | Self::Regression { .. } | Self::BenchmarkFailed { .. }
        )
    }
}

/// Extension trait for displaying errors with context
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (only evaluated on error)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other {
                message: format!("{}: {}", msg, inner),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other {
                message: format!("{}: {}", f(), inner),
            }
        })
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let mut text = error.to_string();

    // Walk the source chain for core errors that wrap loader failures
    if let Error::Core(core) = error {
        let mut source = std::error::Error::source(core);
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !text.contains(&cause_text) {
                text.push_str(&format!("\n  caused by: {}", cause_text));
            }
            source = cause.source();
        }
    }

    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), text)
    } else {
        format!("Error: {}", text)
    }
}
