//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod bench;
mod completions;
mod functional;
mod implementations;

pub use bench::handle_bench;
pub use completions::handle_completions;
pub use functional::handle_functional;
pub use implementations::handle_implementations;

use crate::error::{Error, Result};
use jscompare_core::{Implementation, SchemaDraft};

/// Resolve implementation names from the command line, falling back to the
/// configured allow-list and then to every implementation
pub(crate) fn select_implementations(
    requested: &[String],
    configured: Option<&[String]>,
) -> Result<Vec<Implementation>> {
    let names = if requested.is_empty() {
        configured.unwrap_or_default()
    } else {
        requested
    };
    if names.is_empty() {
        return Ok(Implementation::all().to_vec());
    }

    let mut selected = Vec::new();
    for name in names {
        let implementation = Implementation::from_name(name)
            .ok_or_else(|| Error::UnknownImplementation { name: name.clone() })?;
        if !selected.contains(&implementation) {
            selected.push(implementation);
        }
    }
    // Registration order, whatever order the names came in
    selected.sort();
    Ok(selected)
}

/// Parse draft names, defaulting to every draft
pub(crate) fn parse_drafts(requested: &[String]) -> Result<Vec<SchemaDraft>> {
    if requested.is_empty() {
        return Ok(SchemaDraft::ALL.to_vec());
    }
    let mut drafts = requested
        .iter()
        .map(|name| name.parse::<SchemaDraft>().map_err(Error::invalid_args))
        .collect::<Result<Vec<_>>>()?;
    drafts.sort();
    drafts.dedup();
    Ok(drafts)
}
