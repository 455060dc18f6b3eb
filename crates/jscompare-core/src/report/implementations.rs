use crate::draft::SchemaDraft;
use crate::error::Result;
use crate::implementation::{Implementation, MetaData};
use serde::Serialize;

pub const IMPLEMENTATIONS_JSON: &str = "implementations.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImplementationEntry<'a> {
    #[serde(flatten)]
    metadata: &'a MetaData,
    supported_drafts: Vec<SchemaDraft>,
}

/// Metadata and supported drafts for each implementation, in the given order
pub fn implementations_json(implementations: &[Implementation]) -> Result<String> {
    let entries: Vec<_> = implementations
        .iter()
        .map(|imp| ImplementationEntry {
            metadata: imp.metadata(),
            supported_drafts: imp.supported_drafts().to_vec(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}
