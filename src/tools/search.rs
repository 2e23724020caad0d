//! Search-box style prefix lookup.

use crate::manifest::ALL_SECTION;
use crate::search::normalize_query;
use crate::state::DocsetState;
use crate::table::{SearchEntry, Target};
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Text typed into the search box, e.g. `vlbi_get` or `VLBI types`
    pub query: String,
    /// Search section such as `all`, `functions` or `groups` (default: all)
    #[serde(default)]
    pub section: Option<String>,
    /// Maximum number of results to return
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Returns every entry whose token starts with the escaped query, in the
/// order the HTML search box shows them.
pub async fn handle_search(state: &DocsetState, request: SearchRequest) -> Result<String, String> {
    let docset = state.require_docset().await?;
    let section = request.section.as_deref().unwrap_or(ALL_SECTION);
    let limit = request.limit.unwrap_or(state.config().default_limit);

    let hits = docset
        .prefix_search(section, &request.query, limit)
        .await
        .map_err(|e| e.to_string())?;

    if hits.is_empty() {
        let mut msg = format!(
            "No entries in '{}' start with '{}'.\n",
            section,
            request.query.trim_matches(' ')
        );
        if let Some(index_section) = docset.manifest().section(section) {
            let chars: String = index_section.first_chars.iter().collect();
            let _ = writeln!(msg, "\nThis section has entries starting with: {}", chars);
        }
        if normalize_query(&request.query).is_empty() {
            msg.push_str("\nThe query is empty after removing surrounding spaces.\n");
        }
        return Ok(msg);
    }

    let mut output = format!(
        "Search results for '{}' in '{}' ({} shown):\n\n",
        request.query.trim_matches(' '),
        section,
        hits.len()
    );
    for hit in &hits {
        write_entry(&mut output, &hit.entry);
    }
    Ok(output)
}

/// One entry: label, then one line per target. Target scopes are listed
/// only when they differ from the first one.
pub(crate) fn write_entry(output: &mut String, entry: &SearchEntry) {
    let scope = entry.primary_scope();
    if scope.is_empty() {
        let _ = writeln!(output, "• {}", entry.plain_label());
    } else {
        let _ = writeln!(output, "• {}  [{}]", entry.plain_label(), scope);
    }
    for target in &entry.targets {
        write_target(output, target, scope);
    }
}

fn write_target(output: &mut String, target: &Target, primary_scope: &str) {
    let external = if target.is_local() { "" } else { " (external)" };
    if target.scope.is_empty() || target.scope == primary_scope {
        let _ = writeln!(output, "    {}{}", target.url, external);
    } else {
        let _ = writeln!(output, "    {}{} [{}]", target.url, external, target.scope);
    }
}
