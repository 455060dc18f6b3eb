//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// jscompare - conformance and throughput comparison of JSON Schema validators
///
/// Runs the JSON-Schema-Test-Suite against every registered validator
/// implementation, benchmarks them on bundled fixtures, and writes the
/// results as markdown, JSON and CSV reports.
#[derive(Parser, Debug)]
#[command(
    name = "jscompare",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "JSCOMPARE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the conformance suite against every implementation
    Functional(FunctionalArgs),

    /// Measure compile, validate and serialize throughput
    Bench(BenchArgs),

    /// Write the registered implementations and their draft support
    Implementations(ImplementationsArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the functional command
#[derive(Parser, Debug, Default)]
pub struct FunctionalArgs {
    /// Path to a JSON-Schema-Test-Suite checkout
    #[arg(value_name = "SUITE_DIR")]
    pub suite: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// A previous functional-summary.json to check for regressions
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Only run these implementations (short or long name, repeatable)
    #[arg(short, long = "implementation", value_name = "NAME")]
    pub implementations: Vec<String>,

    /// Only run these drafts (e.g. draft7, draft2020-12, repeatable)
    #[arg(short, long = "draft", value_name = "DRAFT")]
    pub drafts: Vec<String>,

    /// Skip the optional tier of the corpus
    #[arg(long)]
    pub no_optional: bool,

    /// Per-case time limit in milliseconds
    #[arg(long, value_name = "MS")]
    pub case_timeout_ms: Option<u64>,

    /// Print corpus statistics before running
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the bench command
#[derive(Parser, Debug, Default)]
pub struct BenchArgs {
    /// Named benchmarks to run: validate, serialize, all or suite
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Short in-process run that checks wiring rather than producing stable numbers
    #[arg(long)]
    pub smoke: bool,

    /// Directory holding the benchmark fixtures
    #[arg(long, value_name = "DIR")]
    pub benchmarks_dir: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only run these fixtures (repeatable; default is every fixture)
    #[arg(short, long = "fixture", value_name = "NAME")]
    pub fixtures: Vec<String>,

    /// JSON-Schema-Test-Suite checkout timed by the suite benchmark
    #[arg(long, value_name = "DIR")]
    pub suite: Option<PathBuf>,

    /// Only time these drafts in the suite benchmark (repeatable)
    #[arg(short, long = "draft", value_name = "DRAFT")]
    pub drafts: Vec<String>,

    /// Only run these implementations (short or long name, repeatable)
    #[arg(short, long = "implementation", value_name = "NAME")]
    pub implementations: Vec<String>,

    /// Record the run id and timestamp in the JSON report
    #[arg(long)]
    pub run_metadata: bool,

    /// Measure a single implementation and write its records (internal)
    #[arg(long, hide = true, value_name = "NAME")]
    pub worker: Option<String>,

    /// Where a worker writes its records (internal)
    #[arg(long, hide = true, requires = "worker", value_name = "FILE")]
    pub worker_out: Option<PathBuf>,

    /// Timing driver flags: --warm-up-time, --measurement-time, --sample-size, --nresamples
    #[arg(last = true, value_name = "DRIVER_ARGS")]
    pub driver_args: Vec<String>,
}

/// Arguments for the implementations command
#[derive(Parser, Debug, Default)]
pub struct ImplementationsArgs {
    /// Directory implementations.json is written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the listing without writing a file
    #[arg(long)]
    pub print: bool,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        use is_terminal::IsTerminal;
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
