//! Keyword search over entry labels.

use super::search::write_entry;
use crate::state::DocsetState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindRequest {
    /// Words to look for, e.g. `estimate snr` or `baseline projection`
    pub query: String,
    /// Maximum number of results to return
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_find(state: &DocsetState, request: FindRequest) -> Result<String, String> {
    let docset = state.require_docset().await?;
    let limit = request.limit.unwrap_or(state.config().default_limit);

    let hits = docset
        .find(&request.query, limit)
        .await
        .map_err(|e| format!("Keyword search failed: {:#}", e))?;

    if hits.is_empty() {
        let mut msg = format!("No entries match '{}'.\n", request.query);
        let suggestions = docset
            .suggest(&request.query, 5)
            .await
            .map_err(|e| format!("Keyword search failed: {:#}", e))?;
        if !suggestions.is_empty() {
            msg.push_str("\nDid you mean:\n");
            for suggestion in suggestions {
                let _ = writeln!(msg, "• {}", suggestion.label);
            }
        }
        return Ok(msg);
    }

    let max_score = hits.first().map_or(1.0, |h| h.score).max(f32::EPSILON);
    let mut output = format!("Keyword results for '{}':\n\n", request.query);
    for (idx, hit) in hits.iter().enumerate() {
        let relevance = ((hit.score / max_score) * 100.0).round() as u8;
        let _ = write!(output, "{}. relevance {}%  ", idx + 1, relevance);
        write_entry(&mut output, &hit.entry);
    }
    Ok(output)
}
