use crate::draft::SchemaDraft;
use crate::implementation::Implementation;
use crate::remotes::RemoteSchemas;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One schema + instance + expected outcome from the conformance corpus
#[derive(Debug, Clone)]
pub struct ConformanceCase {
    pub draft: SchemaDraft,
    /// Path of the source file relative to its draft directory
    pub file: String,
    pub group: String,
    pub description: String,
    pub comment: Option<String>,
    /// Schema text, shared by every case in the group
    pub schema: Arc<str>,
    pub instance: String,
    pub expected: bool,
    /// Whether the case comes from the `optional` tier of the corpus
    pub optional: bool,
    pub remotes: Arc<RemoteSchemas>,
    /// Implementations known to fail this case, with the reason
    pub known_failing: BTreeMap<Implementation, String>,
}

/// Classification of one case's outcome for one implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Skipped,
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Skipped => "SKIPPED",
            Verdict::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Outcome of one (case, implementation) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ConformanceResult {
    pub implementation: Implementation,
    pub draft: SchemaDraft,
    pub file: String,
    pub group: String,
    pub description: String,
    pub optional: bool,
    pub expected: bool,
    /// The validator's answer, absent when skipped or errored
    pub actual: Option<bool>,
    pub verdict: Verdict,
    /// Skip reason or error message
    pub detail: Option<String>,
    pub elapsed: Duration,
}

impl ConformanceResult {
    pub(crate) fn new(
        implementation: Implementation,
        case: &ConformanceCase,
        verdict: Verdict,
        actual: Option<bool>,
        detail: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            implementation,
            draft: case.draft,
            file: case.file.clone(),
            group: case.group.clone(),
            description: case.description.clone(),
            optional: case.optional,
            expected: case.expected,
            actual,
            verdict,
            detail,
            elapsed,
        }
    }

    pub fn skipped(implementation: Implementation, case: &ConformanceCase, reason: impl Into<String>) -> Self {
        Self::new(
            implementation,
            case,
            Verdict::Skipped,
            None,
            Some(reason.into()),
            Duration::ZERO,
        )
    }

    pub fn errored(
        implementation: Implementation,
        case: &ConformanceCase,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self::new(
            implementation,
            case,
            Verdict::Error,
            None,
            Some(message.into()),
            elapsed,
        )
    }

    /// `PASS` when the answer matches the expectation, else `FAIL`
    pub fn decided(
        implementation: Implementation,
        case: &ConformanceCase,
        actual: bool,
        elapsed: Duration,
    ) -> Self {
        let verdict = if actual == case.expected {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        Self::new(implementation, case, verdict, Some(actual), None, elapsed)
    }
}
