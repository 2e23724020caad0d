//! Serializer reproducing the generator's table layout byte for byte.

use super::entry::{SearchEntry, SearchTable, Target};

const HEADER: &str = "var searchData=\n[\n";
const INDENT: &str = "  ";

/// Writes a table in the generator's layout.
pub fn write_table(table: &SearchTable) -> String {
    let mut out = String::with_capacity(HEADER.len() + table.len() * 128);
    out.push_str(HEADER);

    for (i, entry) in table.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(INDENT);
        push_entry(&mut out, entry);
    }
    if !table.is_empty() {
        out.push('\n');
    }

    out.push_str("];");
    out.push_str(table.trailing());
    out
}

/// Writes a single record, without indentation or separator.
pub fn write_entry(entry: &SearchEntry) -> String {
    let mut out = String::new();
    push_entry(&mut out, entry);
    out
}

fn push_entry(out: &mut String, entry: &SearchEntry) {
    out.push('[');
    push_quoted(out, &entry.token);
    out.push_str(",[");
    push_quoted(out, &entry.label);
    for target in &entry.targets {
        out.push(',');
        push_target(out, target);
    }
    out.push_str("]]");
}

fn push_target(out: &mut String, target: &Target) {
    out.push('[');
    push_quoted(out, &target.url);
    out.push(',');
    if let Some(local) = target.local {
        out.push(if local { '1' } else { '0' });
        out.push(',');
    }
    push_quoted(out, &target.scope);
    out.push(']');
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}
