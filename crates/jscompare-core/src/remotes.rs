//! Remote schema fixtures
//!
//! Some conformance cases reference schemas by absolute URI. The fixtures
//! behind those URIs are read once by the loader and handed to every
//! adapter, so no implementation ever touches the network.

use serde_json::Value;
use std::collections::BTreeMap;

/// Base URI the conformance corpus serves its remote fixtures from
pub const DEFAULT_REMOTE_BASE: &str = "http://localhost:1234/";

/// Remote schema documents keyed by absolute URI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSchemas {
    base: String,
    documents: BTreeMap<String, Value>,
}

impl RemoteSchemas {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            documents: BTreeMap::new(),
        }
    }

    /// An empty set, used for benchmark fixtures which are self-contained
    pub fn empty() -> Self {
        Self::new(DEFAULT_REMOTE_BASE)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Register a document under `base + relative path`
    pub fn insert(&mut self, relative: &str, document: Value) {
        let uri = format!("{}{}", self.base, relative.trim_start_matches('/'));
        self.documents.insert(uri, document);
    }

    /// Look up a document by URI; any fragment is ignored
    pub fn get(&self, uri: &str) -> Option<&Value> {
        let without_fragment = uri.split('#').next().unwrap_or(uri);
        self.documents.get(without_fragment)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.documents.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether a schema's text mentions the remote base URI at all
    pub fn referenced_by(&self, schema_text: &str) -> bool {
        !self.documents.is_empty() && schema_text.contains(self.base.trim_end_matches('/'))
    }
}
