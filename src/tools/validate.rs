//! Integrity checks for a whole docset or a single table.

use crate::docset::DocsetReport;
use crate::state::DocsetState;
use crate::table::{Strictness, ValidationReport};
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Issues listed before the output is cut short.
const MAX_LISTED_ISSUES: usize = 100;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ValidateRequest {
    /// Single table file inside search/, e.g. `all_f.js` (default: every table)
    #[serde(default)]
    pub file: Option<String>,
    /// Require an anchor fragment on every target and ASCII-only tokens
    #[serde(default)]
    pub strict: Option<bool>,
}

/// Validation text and whether any errors were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub text: String,
    pub ok: bool,
}

pub async fn validate(
    state: &DocsetState,
    request: ValidateRequest,
) -> Result<ValidateOutcome, String> {
    let docset = state.require_docset().await?;
    let strictness = match request.strict {
        Some(true) => Strictness::Strict,
        Some(false) => Strictness::Lenient,
        None => docset.options().strictness,
    };

    if let Some(file) = request.file {
        let report = docset
            .validate_file(&file, strictness)
            .await
            .map_err(|e| e.to_string())?;
        return Ok(ValidateOutcome {
            ok: report.is_ok(),
            text: format_file_report(&file, &report),
        });
    }

    let report = docset
        .validate(strictness)
        .await
        .map_err(|e| format!("Validation failed: {:#}", e))?;
    Ok(ValidateOutcome {
        ok: report.is_ok(),
        text: format_docset_report(&report, strictness),
    })
}

pub async fn handle_validate(
    state: &DocsetState,
    request: ValidateRequest,
) -> Result<String, String> {
    validate(state, request).await.map(|outcome| outcome.text)
}

fn format_file_report(file: &str, report: &ValidationReport) -> String {
    let mut output = format!(
        "{}: {} entries, {} errors, {} warnings\n",
        file,
        report.entries,
        report.error_count(),
        report.warnings().count()
    );
    for issue in report.issues.iter().take(MAX_LISTED_ISSUES) {
        let _ = writeln!(output, "  {}", issue);
    }
    if report.issues.len() > MAX_LISTED_ISSUES {
        let _ = writeln!(
            output,
            "  ... and {} more",
            report.issues.len() - MAX_LISTED_ISSUES
        );
    }
    output
}

fn format_docset_report(report: &DocsetReport, strictness: Strictness) -> String {
    let mut output = format!(
        "Validated {} tables ({} entries, {:?} mode): {} errors, {} warnings\n",
        report.files.len(),
        report.entry_count(),
        strictness,
        report.error_count(),
        report.warning_count()
    );

    let mut listed = 0;
    for file in &report.files {
        match &file.outcome {
            Err(e) => {
                let _ = writeln!(output, "\n{}: {}", file.file, e);
                listed += 1;
            }
            Ok(file_report) if !file_report.issues.is_empty() => {
                let _ = writeln!(output, "\n{} (section '{}'):", file.file, file.section);
                for issue in &file_report.issues {
                    if listed == MAX_LISTED_ISSUES {
                        break;
                    }
                    let _ = writeln!(output, "  {}", issue);
                    listed += 1;
                }
            }
            Ok(_) => {}
        }
    }

    if !report.orphans.is_empty() {
        let _ = writeln!(
            output,
            "\nTable files not listed in searchdata.js: {}",
            report.orphans.join(", ")
        );
    }

    let total: usize = report
        .files
        .iter()
        .map(|f| f.outcome.as_ref().map_or(1, |r| r.issues.len()))
        .sum();
    if total > listed {
        let _ = writeln!(output, "\n... and {} more issues", total - listed);
    }
    output
}
