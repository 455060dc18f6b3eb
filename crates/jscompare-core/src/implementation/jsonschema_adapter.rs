use super::{
    mismatch, unsupported, Compiled, CompiledSchema, ErrorDescriptor, Implementation, MetaData,
    ValidationOutcome, ValidatorImplementation,
};
use crate::document::{parse_instance, parse_schema, DocumentModel, ValueModel};
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::remotes::RemoteSchemas;
use jsonschema::{Draft, Retrieve, Uri};
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "Jsonschema";

static METADATA: MetaData = MetaData {
    long_name: "jsonschema",
    short_name: NAME,
    version: "0.32",
    licence: "MIT",
    url: "https://github.com/Stranger6667/jsonschema",
    colour: "rgb(0,114,178)",
};

const DRAFTS: &[SchemaDraft] = &[
    SchemaDraft::Draft4,
    SchemaDraft::Draft6,
    SchemaDraft::Draft7,
    SchemaDraft::Draft2019_09,
    SchemaDraft::Draft2020_12,
];

/// Adapter for the `jsonschema` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonschemaAdapter;

/// Serves remote references from the preloaded fixtures instead of the network
struct FixtureRetriever {
    remotes: Arc<RemoteSchemas>,
}

impl Retrieve for FixtureRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.remotes
            .get(uri.as_str())
            .cloned()
            .ok_or_else(|| format!("remote schema not available: {}", uri.as_str()).into())
    }
}

fn library_draft(draft: SchemaDraft) -> Option<Draft> {
    match draft {
        SchemaDraft::Draft4 => Some(Draft::Draft4),
        SchemaDraft::Draft6 => Some(Draft::Draft6),
        SchemaDraft::Draft7 => Some(Draft::Draft7),
        SchemaDraft::Draft2019_09 => Some(Draft::Draft201909),
        SchemaDraft::Draft2020_12 => Some(Draft::Draft202012),
        SchemaDraft::Draft3 => None,
    }
}

impl ValidatorImplementation for JsonschemaAdapter {
    fn metadata(&self) -> &MetaData {
        &METADATA
    }

    fn supported_drafts(&self) -> &'static [SchemaDraft] {
        DRAFTS
    }

    fn compile(
        &self,
        schema: &str,
        draft: SchemaDraft,
        remotes: &Arc<RemoteSchemas>,
    ) -> Result<CompiledSchema> {
        let library_draft =
            library_draft(draft).ok_or_else(|| unsupported(Implementation::Jsonschema, draft))?;
        let schema = parse_schema(NAME, schema)?;

        let validator = jsonschema::options()
            .with_draft(library_draft)
            .should_validate_formats(true)
            .with_retriever(FixtureRetriever {
                remotes: Arc::clone(remotes),
            })
            .build(&schema)
            .map_err(|e| Error::compilation(NAME, e.to_string()))?;

        Ok(CompiledSchema::new(
            Implementation::Jsonschema,
            Compiled::Jsonschema(validator),
        ))
    }

    fn validate(&self, compiled: &CompiledSchema, instance: &str) -> Result<ValidationOutcome> {
        let Compiled::Jsonschema(validator) = &compiled.inner else {
            return Err(mismatch(Implementation::Jsonschema, compiled));
        };
        let instance = parse_instance(NAME, instance)?;

        let errors = validator
            .iter_errors(&instance)
            .map(|e| ErrorDescriptor {
                path: Some(e.instance_path.to_string()),
                message: e.to_string(),
            })
            .collect();
        Ok(ValidationOutcome::from_errors(errors))
    }

    fn round_trip(&self, document: &str) -> Result<String> {
        ValueModel
            .round_trip(document)
            .map_err(|e| Error::execution(NAME, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_reference_resolved_from_fixtures() {
        let mut remotes = RemoteSchemas::empty();
        remotes.insert("integer.json", json!({"type": "integer"}));
        let remotes = Arc::new(remotes);

        let compiled = JsonschemaAdapter
            .compile(
                r#"{"$ref": "http://localhost:1234/integer.json"}"#,
                SchemaDraft::Draft7,
                &remotes,
            )
            .unwrap();
        assert!(JsonschemaAdapter.validate(&compiled, "1").unwrap().valid);
        assert!(!JsonschemaAdapter.validate(&compiled, r#""a""#).unwrap().valid);
    }

    #[test]
    fn test_format_is_asserted() {
        let compiled = JsonschemaAdapter
            .compile(
                r#"{"format": "ipv4"}"#,
                SchemaDraft::Draft7,
                &Arc::new(RemoteSchemas::empty()),
            )
            .unwrap();
        assert!(!JsonschemaAdapter
            .validate(&compiled, r#""999.1.1.1""#)
            .unwrap()
            .valid);
    }

    #[test]
    fn test_supports_2020_12() {
        let compiled = JsonschemaAdapter
            .compile(
                r#"{"prefixItems": [{"type": "integer"}]}"#,
                SchemaDraft::Draft2020_12,
                &Arc::new(RemoteSchemas::empty()),
            )
            .unwrap();
        assert!(!JsonschemaAdapter.validate(&compiled, r#"["x"]"#).unwrap().valid);
    }
}
