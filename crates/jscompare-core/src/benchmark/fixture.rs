use crate::document::{DocumentModel, TypedModel, ValueModel};
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};

/// One instance document of a fixture
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureInstance {
    /// File stem, used in logs
    pub name: String,
    pub text: String,
}

/// A named schema plus the instance documents it is benchmarked against
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkFixture {
    pub name: String,
    pub draft: SchemaDraft,
    pub schema: String,
    pub instances: Vec<FixtureInstance>,
}

impl BenchmarkFixture {
    /// Build a fixture, detecting the draft from the schema's `$schema`
    pub fn new(name: impl Into<String>, schema: String, instances: Vec<FixtureInstance>) -> Result<Self> {
        let name = name.into();
        let parsed = ValueModel.to_native(&schema).map_err(|e| {
            Error::corpus(name.as_str(), format!("schema is not valid JSON: {}", e))
        })?;
        if instances.is_empty() {
            return Err(Error::corpus(name.as_str(), "fixture has no instance documents"));
        }
        Ok(Self {
            draft: SchemaDraft::detect(&parsed),
            name,
            schema,
            instances,
        })
    }

    /// Override the detected draft
    pub fn with_draft(mut self, draft: SchemaDraft) -> Self {
        self.draft = draft;
        self
    }

    /// Whether every instance binds to the typed test model
    pub fn is_test_model(&self) -> bool {
        self.instances
            .iter()
            .all(|i| TypedModel.to_native(&i.text).is_ok())
    }
}
