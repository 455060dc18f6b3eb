use super::{
    mismatch, unsupported, Compiled, CompiledSchema, ErrorDescriptor, Implementation, MetaData,
    ValidationOutcome, ValidatorImplementation,
};
use crate::document::{parse_instance, parse_schema, DocumentModel, ValueModel};
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::remotes::RemoteSchemas;
use crate::skip::SkipRuleSpec;
use jsonschema_valid::{schemas, Config};
use serde_json::Value;
use std::sync::Arc;

const NAME: &str = "JsonschemaValid";

static METADATA: MetaData = MetaData {
    long_name: "jsonschema_valid",
    short_name: NAME,
    version: "0.5",
    licence: "MPL-2.0",
    url: "https://github.com/mdboom/jsonschema-valid",
    colour: "rgb(0,158,115)",
};

const DRAFTS: &[SchemaDraft] = &[SchemaDraft::Draft4, SchemaDraft::Draft6, SchemaDraft::Draft7];

/// Adapter for the `jsonschema_valid` crate
///
/// The library's `Config` borrows the schema document, so the handle keeps
/// the owned document and rebuilds the config for each validation. This
/// folds reference-resolver setup into the validate timings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonschemaValidAdapter;

pub(crate) struct ValidCompiled {
    schema: Value,
    draft: SchemaDraft,
}

fn library_draft(draft: SchemaDraft) -> Option<schemas::Draft> {
    match draft {
        SchemaDraft::Draft4 => Some(schemas::Draft::Draft4),
        SchemaDraft::Draft6 => Some(schemas::Draft::Draft6),
        SchemaDraft::Draft7 => Some(schemas::Draft::Draft7),
        _ => None,
    }
}

/// The library stores the instance path innermost segment first
fn instance_pointer(reversed: &[String]) -> String {
    reversed.iter().rev().map(|segment| format!("/{}", segment)).collect()
}

impl ValidatorImplementation for JsonschemaValidAdapter {
    fn metadata(&self) -> &MetaData {
        &METADATA
    }

    fn supported_drafts(&self) -> &'static [SchemaDraft] {
        DRAFTS
    }

    fn known_failures(&self) -> Vec<SkipRuleSpec> {
        vec![SkipRuleSpec {
            implementation: Some(NAME.to_string()),
            file: Some(r"^refRemote\.json$".to_string()),
            reason: "remote references are never fetched".to_string(),
            ..SkipRuleSpec::default()
        }]
    }

    fn compile(
        &self,
        schema: &str,
        draft: SchemaDraft,
        _remotes: &Arc<RemoteSchemas>,
    ) -> Result<CompiledSchema> {
        let library_draft = library_draft(draft)
            .ok_or_else(|| unsupported(Implementation::JsonschemaValid, draft))?;
        let schema = parse_schema(NAME, schema)?;

        {
            let config = Config::from_schema(&schema, Some(library_draft))
                .map_err(|e| Error::compilation(NAME, e.to_string()))?;
            // Building the config never consults the meta-schema
            let problems: Vec<String> = match config.validate_schema() {
                Ok(()) => Vec::new(),
                Err(errors) => errors.map(|e| e.msg).collect(),
            };
            if !problems.is_empty() {
                return Err(Error::compilation(NAME, problems.join("; ")));
            }
        }

        Ok(CompiledSchema::new(
            Implementation::JsonschemaValid,
            Compiled::JsonschemaValid(ValidCompiled { schema, draft }),
        ))
    }

    fn validate(&self, compiled: &CompiledSchema, instance: &str) -> Result<ValidationOutcome> {
        let Compiled::JsonschemaValid(handle) = &compiled.inner else {
            return Err(mismatch(Implementation::JsonschemaValid, compiled));
        };
        let instance = parse_instance(NAME, instance)?;
        let library_draft = library_draft(handle.draft)
            .ok_or_else(|| Error::execution(NAME, format!("{} is not supported", handle.draft)))?;

        let config = Config::from_schema(&handle.schema, Some(library_draft))
            .map_err(|e| Error::execution(NAME, e.to_string()))?;

        let errors = match jsonschema_valid::validate(&config, &instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| ErrorDescriptor {
                    path: Some(instance_pointer(&e.instance_path)),
                    message: e.msg,
                })
                .collect(),
        };
        Ok(ValidationOutcome::from_errors(errors))
    }

    fn round_trip(&self, document: &str) -> Result<String> {
        ValueModel
            .round_trip(document)
            .map_err(|e| Error::execution(NAME, e.to_string()))
    }
}
