//! Regenerates a documentation tree's search tables from symbol records.
//!
//! Output is always produced wholesale: every section is rebuilt from the full
//! record list and the previous table files are replaced.

use crate::error::Result;
use crate::manifest::{ALL_SECTION, IndexManifest, IndexSection, bucket_file_name};
use crate::table::{SearchEntry, SearchTable, Target, bucket_char, escape_token, write_table};
use ahash::AHashMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the manifest file inside `search/`.
pub const MANIFEST_FILE: &str = "searchdata.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    File,
    Function,
    Variable,
    Typedef,
    Enum,
    EnumValue,
    Define,
    Group,
    Page,
}

impl SymbolKind {
    /// Sections in the order the generator numbers them.
    pub const ALL: [Self; 10] = [
        Self::Class,
        Self::File,
        Self::Function,
        Self::Variable,
        Self::Typedef,
        Self::Enum,
        Self::EnumValue,
        Self::Define,
        Self::Group,
        Self::Page,
    ];

    pub const fn section(self) -> &'static str {
        match self {
            Self::Class => "classes",
            Self::File => "files",
            Self::Function => "functions",
            Self::Variable => "variables",
            Self::Typedef => "typedefs",
            Self::Enum => "enums",
            Self::EnumValue => "enumvalues",
            Self::Define => "defines",
            Self::Group => "groups",
            Self::Page => "pages",
        }
    }

    pub const fn section_label(self) -> &'static str {
        match self {
            Self::Class => "Data Structures",
            Self::File => "Files",
            Self::Function => "Functions",
            Self::Variable => "Variables",
            Self::Typedef => "Typedefs",
            Self::Enum => "Enumerations",
            Self::EnumValue => "Enumerator",
            Self::Define => "Macros",
            Self::Group => "Modules",
            Self::Page => "Pages",
        }
    }
}

const fn default_local() -> bool {
    true
}

/// One documented symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Identifier used for ordering. For groups and pages this is the id
    /// (`VLBI_Defines`), not the title.
    pub name: String,
    /// Display text; the search token is derived from it.
    pub label: String,
    pub kind: SymbolKind,
    pub url: String,
    #[serde(default = "default_local")]
    pub local: bool,
    #[serde(default)]
    pub scope: String,
}

impl SymbolRecord {
    pub fn token(&self) -> String {
        escape_token(&self.label)
    }
}

/// A bucket file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBucket {
    pub section: String,
    pub first_char: char,
    pub file_name: String,
    pub table: SearchTable,
}

/// The complete output of one regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltIndex {
    pub manifest: IndexManifest,
    pub buckets: Vec<BuiltBucket>,
}

impl BuiltIndex {
    pub fn bucket(&self, section: &str, first_char: char) -> Option<&BuiltBucket> {
        self.buckets
            .iter()
            .find(|b| b.section == section && b.first_char == first_char)
    }

    /// Writes `searchdata.js` and every bucket into `dir`, removing table files
    /// from a previous run first.
    pub async fn write_to_dir(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let removed = remove_previous_output(dir).await?;
        if removed > 0 {
            tracing::debug!("Removed {} stale search files from {}", removed, dir.display());
        }

        for bucket in &self.buckets {
            let path = dir.join(&bucket.file_name);
            tokio::fs::write(&path, write_table(&bucket.table))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        tokio::fs::write(&manifest_path, self.manifest.to_js())
            .await
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        tracing::info!(
            "Wrote {} search tables in {} sections to {}",
            self.buckets.len(),
            self.manifest.sections().len(),
            dir.display()
        );
        Ok(())
    }
}

/// Collects symbol records and turns them into search tables.
#[derive(Debug, Default)]
pub struct TableBuilder {
    records: Vec<SymbolRecord>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: SymbolRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds the `all` section followed by one section per symbol kind that
    /// has records.
    pub fn build(&self) -> BuiltIndex {
        let usable: Vec<&SymbolRecord> = self
            .records
            .iter()
            .filter(|record| {
                let keep = !record.label.is_empty();
                if !keep {
                    tracing::warn!("Skipping symbol '{}' with an empty label", record.name);
                }
                keep
            })
            .collect();

        let mut sections = Vec::new();
        let mut buckets = Vec::new();

        let mut add_section = |name: &str, label: &str, records: Vec<&SymbolRecord>| {
            if records.is_empty() {
                return;
            }
            let by_char = build_buckets(records);
            let id = sections.len();
            let first_chars: Vec<char> = by_char.keys().copied().collect();
            for (position, (first_char, entries)) in by_char.into_iter().enumerate() {
                buckets.push(BuiltBucket {
                    section: name.to_string(),
                    first_char,
                    file_name: bucket_file_name(name, position),
                    table: SearchTable::new(entries),
                });
            }
            sections.push(IndexSection {
                id,
                name: name.to_string(),
                label: label.to_string(),
                first_chars,
            });
        };

        add_section(ALL_SECTION, "All", usable.clone());
        for kind in SymbolKind::ALL {
            let records = usable.iter().copied().filter(|r| r.kind == kind).collect();
            add_section(kind.section(), kind.section_label(), records);
        }

        BuiltIndex {
            manifest: IndexManifest::new(sections),
            buckets,
        }
    }
}

impl Extend<SymbolRecord> for TableBuilder {
    fn extend<T: IntoIterator<Item = SymbolRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl FromIterator<SymbolRecord> for TableBuilder {
    fn from_iter<T: IntoIterator<Item = SymbolRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Case-insensitive, byte-wise ordering on the symbol name, then the token.
pub fn compare_records(a: &SymbolRecord, b: &SymbolRecord) -> Ordering {
    let lhs = a.name.bytes().map(|b| b.to_ascii_lowercase());
    let rhs = b.name.bytes().map(|b| b.to_ascii_lowercase());
    lhs.cmp(rhs).then_with(|| a.token().cmp(&b.token()))
}

/// Sorts records, merges same-token records into one entry, and groups the
/// entries by first character.
fn build_buckets(mut records: Vec<&SymbolRecord>) -> BTreeMap<char, Vec<SearchEntry>> {
    records.sort_by(|a, b| compare_records(a, b));

    let mut entries: Vec<SearchEntry> = Vec::with_capacity(records.len());
    let mut by_token: AHashMap<String, usize> = AHashMap::with_capacity(records.len());

    for record in records {
        let token = record.token();
        let target = Target::new(record.url.clone(), record.local, record.scope.clone());
        if let Some(&index) = by_token.get(&token) {
            entries[index].targets.push(target);
        } else {
            by_token.insert(token.clone(), entries.len());
            entries.push(SearchEntry::new(token, record.label.clone(), vec![target]));
        }
    }

    let mut buckets: BTreeMap<char, Vec<SearchEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(c) = bucket_char(&entry.token) {
            buckets.entry(c).or_default().push(entry);
        }
    }
    buckets
}

async fn remove_previous_output(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    while let Some(entry) = read_dir.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name == MANIFEST_FILE || is_bucket_file_name(name) {
            tokio::fs::remove_file(entry.path())
                .await
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// `<section>_<hex>.js` for a known section name.
pub fn is_bucket_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".js") else {
        return false;
    };
    let Some((section, position)) = stem.rsplit_once('_') else {
        return false;
    };
    let known = section == ALL_SECTION || SymbolKind::ALL.iter().any(|k| k.section() == section);
    known && !position.is_empty() && position.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    fn record(name: &str, label: &str, kind: SymbolKind, url: &str) -> SymbolRecord {
        SymbolRecord {
            name: name.into(),
            label: label.into(),
            kind,
            url: url.into(),
            local: true,
            scope: "vlbi.h".into(),
        }
    }

    #[test]
    fn test_groups_sort_by_name_not_title() {
        let builder: TableBuilder = [
            record("vlbi_del_stream", "vlbi_del_stream", SymbolKind::Function, "../f.html#a"),
            record("VLBI_Defines", "VLBI defines", SymbolKind::Group, "../d.html"),
            record("vlbi_convert", "vlbi_convert", SymbolKind::Function, "../f.html#b"),
        ]
        .into_iter()
        .collect();

        let built = builder.build();
        let_assert!(Some(bucket) = built.bucket(ALL_SECTION, 'v'));
        let tokens: Vec<&str> = bucket.table.iter().map(|e| e.token.as_str()).collect();
        check!(tokens == vec!["vlbi_5fconvert", "vlbi_20defines", "vlbi_5fdel_5fstream"]);
    }

    #[test]
    fn test_same_token_merges_targets() {
        let mut builder = TableBuilder::new();
        builder
            .add(record("init", "init", SymbolKind::Function, "../a.html#x"))
            .add(record("init", "init", SymbolKind::Variable, "../b.html#y"));

        let built = builder.build();
        let_assert!(Some(all) = built.bucket(ALL_SECTION, 'i'));
        check!(all.table.len() == 1);
        check!(all.table.entries()[0].targets.len() == 2);

        let_assert!(Some(functions) = built.bucket("functions", 'i'));
        check!(functions.table.entries()[0].targets.len() == 1);
    }

    #[test]
    fn test_manifest_matches_buckets() {
        let builder: TableBuilder = [
            record("alpha", "alpha", SymbolKind::Function, "../a.html#a"),
            record("_private", "_private", SymbolKind::Variable, "../a.html#b"),
            record("beta", "beta", SymbolKind::Function, "../a.html#c"),
        ]
        .into_iter()
        .collect();

        let built = builder.build();
        let names: Vec<&str> = built
            .manifest
            .sections()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        check!(names == vec!["all", "functions", "variables"]);

        let_assert!(Some(all) = built.manifest.section(ALL_SECTION));
        check!(all.first_chars == vec!['_', 'a', 'b']);
        for (c, file) in all.bucket_files() {
            let_assert!(Some(bucket) = built.bucket(ALL_SECTION, c));
            check!(bucket.file_name == file);
        }
        check!(built.buckets.len() == 3 + 2 + 1);
    }

    #[test]
    fn test_empty_labels_are_skipped() {
        let builder: TableBuilder = [record("x", "", SymbolKind::Function, "../a.html#a")]
            .into_iter()
            .collect();
        let built = builder.build();
        check!(built.buckets.is_empty());
        check!(built.manifest.sections().is_empty());
    }

    #[rstest]
    #[case("all_f.js", true)]
    #[case("functions_10.js", true)]
    #[case("enumvalues_0.js", true)]
    #[case("search.js", false)]
    #[case("all_.js", false)]
    #[case("mystuff_1.js", false)]
    #[case("all_f.html", false)]
    fn test_is_bucket_file_name(#[case] name: &str, #[case] expected: bool) {
        check!(is_bucket_file_name(name) == expected);
    }

    #[test]
    fn test_symbol_record_json_defaults() {
        let json = r#"{"name":"vlbi_init","label":"vlbi_init","kind":"function","url":"../f.html#a"}"#;
        let_assert!(Ok(record) = serde_json::from_str::<SymbolRecord>(json));
        check!(record.local);
        check!(record.scope.is_empty());
        check!(record.token() == "vlbi_5finit");
    }
}
