//! Implementations command handler

use crate::cli::ImplementationsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use jscompare_core::report::{self, implementations};
use jscompare_core::Implementation;
use tracing::instrument;

fn listing_rows() -> Vec<Vec<String>> {
    Implementation::all()
        .iter()
        .map(|imp| {
            let meta = imp.metadata();
            let drafts: Vec<_> = imp.supported_drafts().iter().map(|d| d.to_string()).collect();
            vec![
                meta.short_name.to_string(),
                meta.long_name.to_string(),
                meta.version.to_string(),
                drafts.join(", "),
            ]
        })
        .collect()
}

/// Handle the implementations command
#[instrument(skip_all, fields(print = args.print))]
pub async fn handle_implementations(
    args: ImplementationsArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    if output.is_human() {
        output.table(&["Name", "Library", "Version", "Drafts"], listing_rows())?;
    } else {
        let json = implementations::implementations_json(Implementation::all())?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        output.data(&value)?;
    }

    if !args.print {
        let dir = args.output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
        let path = report::write_implementations(&dir, Implementation::all())?;
        output.info(&format!("Wrote {}", path.display()))?;
    }
    Ok(())
}
