//! Parse-and-rewrite check: a table must serialize back to the same bytes.

use crate::builder::is_bucket_file_name;
use crate::error::Result;
use crate::table::{parse_table, write_table};
use anyhow::Context;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRoundtrip {
    pub path: PathBuf,
    pub entries: usize,
    /// 1-based `(line, column)` of the first differing character.
    pub first_difference: Option<(usize, usize)>,
}

impl FileRoundtrip {
    pub const fn is_identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Round-trips one table file.
pub async fn roundtrip_file(path: &Path) -> Result<FileRoundtrip> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table =
        parse_table(&source).with_context(|| format!("Failed to parse {}", path.display()))?;
    let written = write_table(&table);

    Ok(FileRoundtrip {
        path: path.to_path_buf(),
        entries: table.len(),
        first_difference: first_difference(&source, &written),
    })
}

/// Round-trips a table file, or every table file in a directory.
pub async fn roundtrip(path: &Path) -> Result<Vec<FileRoundtrip>> {
    if !tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?
        .is_dir()
    {
        return Ok(vec![roundtrip_file(path).await?]);
    }

    let mut files = Vec::new();
    let mut read_dir = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Failed to list {}", path.display()))?;
    while let Some(entry) = read_dir.next_entry().await? {
        if entry
            .file_name()
            .to_str()
            .is_some_and(is_bucket_file_name)
        {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        results.push(roundtrip_file(&file).await?);
    }
    Ok(results)
}

pub fn format_roundtrip(results: &[FileRoundtrip]) -> String {
    let mut output = String::new();
    for result in results {
        match result.first_difference {
            None => {
                let _ = writeln!(
                    output,
                    "{}: {} entries, identical",
                    result.path.display(),
                    result.entries
                );
            }
            Some((line, column)) => {
                let _ = writeln!(
                    output,
                    "{}: {} entries, differs at line {}, column {}",
                    result.path.display(),
                    result.entries,
                    line,
                    column
                );
            }
        }
    }
    if results.is_empty() {
        output.push_str("No table files found.\n");
    }
    output
}

/// Position of the first character where `a` and `b` differ.
pub fn first_difference(a: &str, b: &str) -> Option<(usize, usize)> {
    let (mut line, mut column) = (1, 1);
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return None,
            (l, r) if l != r => return Some((line, column)),
            (Some('\n'), _) => {
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
    }
}
