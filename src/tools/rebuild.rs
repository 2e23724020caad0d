//! Regenerating a `search/` directory from a JSON symbol list.

use crate::builder::{SymbolRecord, TableBuilder};
use crate::error::Result;
use anyhow::Context;
use std::fmt::Write as _;
use std::path::Path;

/// Reads `symbols` (a JSON array of symbol records) and writes a fresh set of
/// tables plus `searchdata.js` into `output`.
pub async fn rebuild(symbols: &Path, output: &Path) -> Result<String> {
    let source = tokio::fs::read_to_string(symbols)
        .await
        .with_context(|| format!("Failed to read {}", symbols.display()))?;
    let records: Vec<SymbolRecord> = serde_json::from_str(&source)
        .with_context(|| format!("Invalid symbol list in {}", symbols.display()))?;

    let builder: TableBuilder = records.into_iter().collect();
    let symbol_count = builder.len();
    let built = builder.build();
    built.write_to_dir(output).await?;

    let mut summary = format!(
        "Wrote {} tables for {} symbols to {}\n",
        built.buckets.len(),
        symbol_count,
        output.display()
    );
    for section in built.manifest.sections() {
        let entries: usize = built
            .buckets
            .iter()
            .filter(|b| b.section == section.name)
            .map(|b| b.table.len())
            .sum();
        let _ = writeln!(
            summary,
            "  {}: {} tables, {} entries",
            section.name,
            section.first_chars.len(),
            entries
        );
    }
    Ok(summary)
}
