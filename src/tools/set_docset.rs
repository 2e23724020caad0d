//! Switching the active documentation tree.

use crate::state::DocsetState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDocsetRequest {
    /// Generated HTML directory (containing search/) or the search/ directory itself
    pub path: String,
}

pub async fn handle_set_docset(
    state: &DocsetState,
    request: SetDocsetRequest,
) -> Result<String, String> {
    let previous = state
        .open(&PathBuf::from(&request.path))
        .await
        .map_err(|e| format!("Failed to open docset '{}': {:#}", request.path, e))?;
    let docset = state.require_docset().await?;

    let mut response = format!("Docset configured: {}\n", docset.root().display());
    if let Some(previous) = previous
        && previous.root() != docset.root()
    {
        let _ = writeln!(response, "Previously: {}", previous.root().display());
    }

    let manifest = docset.manifest();
    let _ = writeln!(
        response,
        "\nSections ({}):",
        manifest.sections().len()
    );
    for section in manifest.sections() {
        let _ = writeln!(
            response,
            "  - {} ({}, {} tables)",
            section.name,
            section.label,
            section.first_chars.len()
        );
    }
    Ok(response)
}
