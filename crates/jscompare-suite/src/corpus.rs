//! JSON-Schema-Test-Suite loading
//!
//! Layout of a checkout:
//!
//! ```text
//! <root>/test-schema.json
//! <root>/remotes/**/*.json
//! <root>/tests/<draft>/*.json
//! <root>/tests/<draft>/optional/*.json
//! <root>/tests/<draft>/optional/format/*.json
//! ```

use crate::{Result, SuiteError, SUITE_MARKER};
use colored::Colorize;
use jscompare_core::{ConformanceCase, RemoteSchemas, SchemaDraft, DEFAULT_REMOTE_BASE};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Subdirectories of a draft directory, and whether their cases are optional
const TIERS: [(&str, bool); 3] = [("", false), ("optional", true), ("optional/format", true)];

/// One group in a test file: a schema and the cases run against it
#[derive(Debug, Deserialize)]
struct TestGroup {
    description: String,
    #[serde(default)]
    comment: Option<String>,
    schema: Box<RawValue>,
    tests: Vec<TestEntry>,
}

#[derive(Debug, Deserialize)]
struct TestEntry {
    description: String,
    #[serde(default)]
    comment: Option<String>,
    data: Box<RawValue>,
    valid: bool,
}

/// Loaded conformance cases plus the remote fixtures they share
#[derive(Debug, Clone)]
pub struct Corpus {
    pub cases: Vec<ConformanceCase>,
    pub remotes: Arc<RemoteSchemas>,
}

impl Corpus {
    pub fn statistics(&self) -> CorpusStatistics {
        let mut stats = CorpusStatistics {
            total_cases: self.cases.len(),
            remote_documents: self.remotes.len(),
            ..Default::default()
        };
        let mut files = std::collections::BTreeSet::new();
        for case in &self.cases {
            if case.optional {
                stats.optional_cases += 1;
            }
            *stats.cases_by_draft.entry(case.draft).or_insert(0) += 1;
            files.insert((case.draft, case.file.as_str()));
        }
        stats.files = files.len();
        stats
    }
}

/// Statistics about a loaded corpus
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CorpusStatistics {
    pub total_cases: usize,
    pub optional_cases: usize,
    pub files: usize,
    pub remote_documents: usize,
    pub cases_by_draft: BTreeMap<SchemaDraft, usize>,
}

impl CorpusStatistics {
    /// Print statistics to stdout
    pub fn print(&self) {
        println!("{}", "=== Corpus Statistics ===".bold());
        println!("Total cases: {}", self.total_cases);
        println!("Optional: {}", self.optional_cases);
        println!("Files: {}", self.files);
        println!("Remote documents: {}", self.remote_documents);

        if !self.cases_by_draft.is_empty() {
            println!("\nCases by draft:");
            for (draft, count) in &self.cases_by_draft {
                println!("  {}: {}", draft.display_name(), count);
            }
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SuiteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `*.json` files directly inside `dir`, sorted by name
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| SuiteError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// `path` relative to `base`, with forward slashes
fn relative_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads a JSON-Schema-Test-Suite checkout
pub struct CorpusLoader {
    root: PathBuf,
    remote_base: String,
}

impl CorpusLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail unless the root looks like a suite checkout
    pub fn ensure_present(&self) -> Result<()> {
        if self.root.join(SUITE_MARKER).is_file() {
            Ok(())
        } else {
            Err(SuiteError::MissingCorpus {
                path: self.root.clone(),
            })
        }
    }

    /// Every document under `remotes/`, keyed by its served URI
    pub fn load_remotes(&self) -> Result<RemoteSchemas> {
        let mut remotes = RemoteSchemas::new(self.remote_base.clone());
        let dir = self.root.join("remotes");
        if !dir.is_dir() {
            return Ok(remotes);
        }

        for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| SuiteError::Io {
                path: dir.clone(),
                source: e.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let document: Value = serde_json::from_str(&read(path)?).map_err(|source| SuiteError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            remotes.insert(&relative_name(&dir, path), document);
        }
        debug!(count = remotes.len(), "Loaded remote fixtures");
        Ok(remotes)
    }

    /// Load the given drafts, in order; drafts with no directory contribute nothing
    pub fn load(&self, drafts: &[SchemaDraft]) -> Result<Corpus> {
        self.ensure_present()?;
        let remotes = Arc::new(self.load_remotes()?);

        let mut cases = Vec::new();
        for &draft in drafts {
            let loaded = self.load_draft(draft, &remotes)?;
            info!(draft = %draft, cases = loaded.len(), "Loaded draft");
            cases.extend(loaded);
        }
        Ok(Corpus { cases, remotes })
    }

    /// Load every draft the suite has a directory for
    pub fn load_all(&self) -> Result<Corpus> {
        self.load(&SchemaDraft::ALL)
    }

    pub fn load_draft(&self, draft: SchemaDraft, remotes: &Arc<RemoteSchemas>) -> Result<Vec<ConformanceCase>> {
        let draft_dir = self.root.join("tests").join(draft.dir_name());
        if !draft_dir.is_dir() {
            debug!(draft = %draft, "No directory for draft");
            return Ok(Vec::new());
        }

        let mut cases = Vec::new();
        for (tier, optional) in TIERS {
            let dir = if tier.is_empty() { draft_dir.clone() } else { draft_dir.join(tier) };
            if !dir.is_dir() {
                continue;
            }
            for path in json_files(&dir)? {
                let file = relative_name(&draft_dir, &path);
                cases.extend(Self::load_file(&path, file, draft, optional, remotes)?);
            }
        }
        Ok(cases)
    }

    /// Parse one test file, preserving group and case order
    fn load_file(
        path: &Path,
        file: String,
        draft: SchemaDraft,
        optional: bool,
        remotes: &Arc<RemoteSchemas>,
    ) -> Result<Vec<ConformanceCase>> {
        let text = read(path)?;
        let groups: Vec<TestGroup> = serde_json::from_str(&text).map_err(|e| SuiteError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut cases = Vec::new();
        for group in groups {
            let schema: Arc<str> = Arc::from(group.schema.get());
            for test in group.tests {
                cases.push(ConformanceCase {
                    draft,
                    file: file.clone(),
                    group: group.description.clone(),
                    description: test.description,
                    comment: test.comment.or_else(|| group.comment.clone()),
                    schema: Arc::clone(&schema),
                    instance: test.data.get().to_string(),
                    expected: test.valid,
                    optional,
                    remotes: Arc::clone(remotes),
                    known_failing: BTreeMap::new(),
                });
            }
        }
        Ok(cases)
    }
}
