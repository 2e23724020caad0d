//! Listing of the search sections declared in `searchdata.js`.

use crate::state::DocsetState;
use std::fmt::Write as _;

pub async fn handle_sections(state: &DocsetState) -> Result<String, String> {
    let docset = state.require_docset().await?;
    let manifest = docset.manifest();

    let mut output = format!(
        "Docset {} ({} sections, {} tables):\n\n",
        docset.root().display(),
        manifest.sections().len(),
        manifest.bucket_count()
    );
    for section in manifest.sections() {
        let chars: String = section.first_chars.iter().collect();
        let _ = writeln!(
            output,
            "{:>2}. {} ({}): {} buckets [{}]",
            section.id,
            section.name,
            section.label,
            section.first_chars.len(),
            chars
        );
    }
    Ok(output)
}
