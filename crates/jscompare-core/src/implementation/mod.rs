//! Validator implementation abstraction
//!
//! Every wrapped library gets exactly one adapter implementing
//! [`ValidatorImplementation`]. The adapters are registered in the fixed
//! [`Implementation`] set; nothing is discovered at runtime.
//!
//! Adapters take JSON text, not parsed trees. Parsing happens inside the
//! adapter using its preferred document model, so a malformed schema surfaces
//! as a [`Error::SchemaCompilation`] rather than escaping the boundary.

mod jsonschema_adapter;
mod jsonschema_valid_adapter;
mod valico_adapter;

pub use jsonschema_adapter::JsonschemaAdapter;
pub use jsonschema_valid_adapter::JsonschemaValidAdapter;
pub use valico_adapter::ValicoAdapter;

use crate::draft::SchemaDraft;
use crate::error::{Error, Result};
use crate::remotes::RemoteSchemas;
use crate::skip::SkipRuleSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Descriptive metadata for an implementation, used in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Library name as published
    pub long_name: &'static str,
    /// Alphanumeric identifier used in tables and file names
    pub short_name: &'static str,
    pub version: &'static str,
    pub licence: &'static str,
    pub url: &'static str,
    /// Chart colour for documentation graphs
    pub colour: &'static str,
}

/// One problem reported by a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Result of validating one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<ErrorDescriptor>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<ErrorDescriptor>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Capability contract every adapter fulfils
pub trait ValidatorImplementation: Send + Sync {
    fn metadata(&self) -> &MetaData;

    /// Drafts this adapter claims to support
    fn supported_drafts(&self) -> &'static [SchemaDraft];

    fn supports(&self, draft: SchemaDraft) -> bool {
        self.supported_drafts().contains(&draft)
    }

    /// Cases the adapter author knows the library gets wrong
    fn known_failures(&self) -> Vec<SkipRuleSpec> {
        Vec::new()
    }

    /// Compile a schema document into a reusable handle
    fn compile(
        &self,
        schema: &str,
        draft: SchemaDraft,
        remotes: &Arc<RemoteSchemas>,
    ) -> Result<CompiledSchema>;

    /// Validate an instance document against a handle this adapter produced
    fn validate(&self, compiled: &CompiledSchema, instance: &str) -> Result<ValidationOutcome>;

    /// Parse a document into the adapter's native tree and render it back
    fn round_trip(&self, document: &str) -> Result<String>;
}

/// Opaque compiled schema, owned by the implementation that produced it
pub struct CompiledSchema {
    implementation: Implementation,
    inner: Compiled,
}

pub(crate) enum Compiled {
    Jsonschema(jsonschema::Validator),
    Valico(valico_adapter::ValicoCompiled),
    JsonschemaValid(jsonschema_valid_adapter::ValidCompiled),
}

impl CompiledSchema {
    pub(crate) fn new(implementation: Implementation, inner: Compiled) -> Self {
        Self {
            implementation,
            inner,
        }
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}

fn mismatch(expected: Implementation, compiled: &CompiledSchema) -> Error {
    Error::execution(
        expected.short_name(),
        format!(
            "schema was compiled by {}, not {}",
            compiled.implementation, expected
        ),
    )
}

fn unsupported(implementation: Implementation, draft: SchemaDraft) -> Error {
    Error::compilation(
        implementation.short_name(),
        format!("{} is not supported", draft.display_name()),
    )
}

static JSONSCHEMA: JsonschemaAdapter = JsonschemaAdapter;
static VALICO: ValicoAdapter = ValicoAdapter;
static JSONSCHEMA_VALID: JsonschemaValidAdapter = JsonschemaValidAdapter;

/// The registered implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Implementation {
    Jsonschema,
    Valico,
    JsonschemaValid,
}

impl Implementation {
    const ALL: [Implementation; 3] = [
        Implementation::Jsonschema,
        Implementation::Valico,
        Implementation::JsonschemaValid,
    ];

    /// Every implementation, in registration order
    pub fn all() -> &'static [Implementation] {
        &Self::ALL
    }

    pub fn adapter(self) -> &'static dyn ValidatorImplementation {
        match self {
            Implementation::Jsonschema => &JSONSCHEMA,
            Implementation::Valico => &VALICO,
            Implementation::JsonschemaValid => &JSONSCHEMA_VALID,
        }
    }

    pub fn metadata(self) -> &'static MetaData {
        self.adapter().metadata()
    }

    pub fn short_name(self) -> &'static str {
        self.metadata().short_name
    }

    /// Resolve a short or long name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|imp| {
            let meta = imp.metadata();
            meta.short_name.eq_ignore_ascii_case(name) || meta.long_name.eq_ignore_ascii_case(name)
        })
    }

    pub fn supported_drafts(self) -> &'static [SchemaDraft] {
        self.adapter().supported_drafts()
    }

    pub fn supports(self, draft: SchemaDraft) -> bool {
        self.adapter().supports(draft)
    }

    pub fn compile(
        self,
        schema: &str,
        draft: SchemaDraft,
        remotes: &Arc<RemoteSchemas>,
    ) -> Result<CompiledSchema> {
        self.adapter().compile(schema, draft, remotes)
    }

    pub fn validate(self, compiled: &CompiledSchema, instance: &str) -> Result<ValidationOutcome> {
        self.adapter().validate(compiled, instance)
    }

    pub fn round_trip(self, document: &str) -> Result<String> {
        self.adapter().round_trip(document)
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
