use super::{
    mismatch, unsupported, Compiled, CompiledSchema, ErrorDescriptor, Implementation, MetaData,
    ValidationOutcome, ValidatorImplementation,
};
use crate::document::{parse_instance, parse_schema, DocumentModel, ValueModel};
use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::remotes::RemoteSchemas;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use valico::json_schema::Scope;

const NAME: &str = "Valico";

static METADATA: MetaData = MetaData {
    long_name: "valico",
    short_name: NAME,
    version: "4.0",
    licence: "MIT",
    url: "https://github.com/s-panferov/valico",
    colour: "rgb(230,159,0)",
};

const DRAFTS: &[SchemaDraft] = &[SchemaDraft::Draft4, SchemaDraft::Draft6, SchemaDraft::Draft7];

/// Adapter for the `valico` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ValicoAdapter;

/// Valico resolves schemas through a scope, so the handle owns one
pub(crate) struct ValicoCompiled {
    scope: Scope,
    id: Url,
}

impl ValidatorImplementation for ValicoAdapter {
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
        if !self.supports(draft) {
            return Err(unsupported(Implementation::Valico, draft));
        }
        let document = parse_schema(NAME, schema)?;

        let mut scope = Scope::new();
        // Remote documents must be in the scope before the referencing schema compiles
        if remotes.referenced_by(schema) {
            for (uri, remote) in remotes.iter() {
                let remote_id = Url::parse(uri)
                    .map_err(|e| Error::compilation(NAME, format!("bad remote uri {}: {}", uri, e)))?;
                if let Err(e) = scope.compile_with_id(&remote_id, remote.clone(), false) {
                    debug!(uri, error = ?e, "valico rejected remote fixture");
                }
            }
        }

        let id = scope
            .compile(document, false)
            .map_err(|e| Error::compilation(NAME, format!("{:?}", e)))?;

        Ok(CompiledSchema::new(
            Implementation::Valico,
            Compiled::Valico(ValicoCompiled { scope, id }),
        ))
    }

    fn validate(&self, compiled: &CompiledSchema, instance: &str) -> Result<ValidationOutcome> {
        let Compiled::Valico(handle) = &compiled.inner else {
            return Err(mismatch(Implementation::Valico, compiled));
        };
        let instance = parse_instance(NAME, instance)?;

        let schema = handle
            .scope
            .resolve(&handle.id)
            .ok_or_else(|| Error::execution(NAME, format!("schema {} missing from scope", handle.id)))?;
        let state = schema.validate(&instance);

        if !state.missing.is_empty() {
            let missing: Vec<String> = state.missing.iter().map(Url::to_string).collect();
            return Err(Error::execution(
                NAME,
                format!("unresolved references: {}", missing.join(", ")),
            ));
        }

        let errors = state
            .errors
            .iter()
            .map(|e| ErrorDescriptor {
                path: Some(e.get_path().to_string()),
                message: e.get_title().to_string(),
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
