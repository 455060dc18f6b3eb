//! Bundled benchmark fixtures
//!
//! Each fixture is a directory `<benchmarks>/<name>/` holding `schema.json`
//! and an `instances/` directory of JSON documents.

use crate::{Result, SuiteError};
use jscompare_core::{BenchmarkFixture, FixtureInstance};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SCHEMA_FILE: &str = "schema.json";
const INSTANCES_DIR: &str = "instances";

pub struct FixtureLoader {
    dir: PathBuf,
}

impl FixtureLoader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of every fixture directory, sorted
    pub fn available(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| SuiteError::Io {
                path: self.dir.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_dir() && entry.path().join(SCHEMA_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<BenchmarkFixture> {
        let fixture_dir = self.dir.join(name);
        let schema_path = fixture_dir.join(SCHEMA_FILE);
        if !schema_path.is_file() {
            return Err(SuiteError::Fixture {
                name: name.to_string(),
                message: format!("{} not found", schema_path.display()),
            });
        }
        let schema = fs::read_to_string(&schema_path).map_err(|source| SuiteError::Io {
            path: schema_path.clone(),
            source,
        })?;

        let instances_dir = fixture_dir.join(INSTANCES_DIR);
        let mut instances = Vec::new();
        if instances_dir.is_dir() {
            for entry in WalkDir::new(&instances_dir).min_depth(1).max_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| SuiteError::Io {
                    path: instances_dir.clone(),
                    source: e.into(),
                })?;
                let path = entry.path();
                if !entry.file_type().is_file() || !path.extension().is_some_and(|ext| ext == "json") {
                    continue;
                }
                let text = fs::read_to_string(path).map_err(|source| SuiteError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                // Instances must at least be JSON; schema conformance is checked at pre-flight
                serde_json::from_str::<serde_json::Value>(&text).map_err(|source| SuiteError::Json {
                    path: path.to_path_buf(),
                    source,
                })?;
                instances.push(FixtureInstance {
                    name: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    text,
                });
            }
        }

        BenchmarkFixture::new(name, schema, instances).map_err(|e| SuiteError::Fixture {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Load the named fixtures, or every available one when `names` is empty
    pub fn load_many(&self, names: &[String]) -> Result<Vec<BenchmarkFixture>> {
        let names = if names.is_empty() {
            self.available()?
        } else {
            names.to_vec()
        };
        if names.is_empty() {
            return Err(SuiteError::Fixture {
                name: self.dir.display().to_string(),
                message: "no benchmark fixtures found".to_string(),
            });
        }
        names.iter().map(|name| self.load(name)).collect()
    }
}
