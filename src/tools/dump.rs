//! Table contents as JSON.

use crate::error::Result;
use crate::table::{SearchEntry, parse_table};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct DumpedEntry<'a> {
    #[serde(flatten)]
    entry: &'a SearchEntry,
    /// Decoded token, or `null` when it does not decode.
    name: Option<String>,
}

/// Parses a table file and renders its entries as a JSON array.
pub async fn dump_table(path: &Path, pretty: bool) -> Result<String> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table =
        parse_table(&source).with_context(|| format!("Failed to parse {}", path.display()))?;

    let entries: Vec<DumpedEntry<'_>> = table
        .iter()
        .map(|entry| DumpedEntry {
            entry,
            name: entry.unescaped_token().ok(),
        })
        .collect();

    let json = if pretty {
        serde_json::to_string_pretty(&entries)
    } else {
        serde_json::to_string(&entries)
    }
    .context("Failed to serialize entries")?;
    Ok(json)
}
