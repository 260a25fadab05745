//! Export mode: writes the selected identifiers to a file instead of typing
//! them. Barcode sheets and manual checks consume this output.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::ExportFormat;
use crate::dispatch::EntryProtocol;
use crate::pipeline::WorkList;

#[derive(Debug, Serialize)]
struct ExportEntry<'a> {
    identifier: &'a str,
    protocol: EntryProtocol,
}

/// Renders the work list in the requested format.
pub fn render(work: &WorkList, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Lines => Ok(work
            .identifiers()
            .map(|id| format!("{id}\n"))
            .collect()),
        ExportFormat::Json => {
            let entries: Vec<ExportEntry<'_>> = work
                .items()
                .iter()
                .map(|item| ExportEntry {
                    identifier: &item.identifier,
                    protocol: EntryProtocol::for_item(item.special),
                })
                .collect();
            let mut json = serde_json::to_string_pretty(&entries)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Writes the rendered work list to `path`, replacing any existing file.
pub fn write(work: &WorkList, path: &Path, format: ExportFormat) -> Result<()> {
    let contents = render(work, format)?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    Ok(())
}
