//! A generated HTML documentation tree and its `search/` directory.

use crate::builder::{MANIFEST_FILE, is_bucket_file_name};
use crate::cache::{self, INDEX_CACHE_FILE};
use crate::config::Config;
use crate::error::{LoadError, Result};
use crate::manifest::{ALL_SECTION, IndexManifest};
use crate::search::{
    EntryLocation, KeywordIndex, Suggestion, matches_prefix, normalize_query, query_bucket,
};
use crate::table::{
    SearchEntry, SearchTable, Strictness, ValidationReport, parse_table, validate_bucket,
    validate_table,
};
use anyhow::Context;
use futures::future::try_join_all;
use lru::LruCache;
use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocsetOptions {
    pub cache_size: usize,
    pub strictness: Strictness,
    /// Persist the keyword index next to the tables.
    pub keyword_index_cache: bool,
}

impl Default for DocsetOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DocsetOptions {
    fn from(config: &Config) -> Self {
        Self {
            cache_size: config.cache_size,
            strictness: config.strictness,
            keyword_index_cache: config.keyword_index,
        }
    }
}

/// One prefix-search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub file: String,
    pub position: usize,
    pub entry: SearchEntry,
}

/// One keyword-search result, resolved back to its table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordHit {
    pub location: EntryLocation,
    pub score: f32,
    pub entry: SearchEntry,
}

/// Validation outcome of one bucket file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub section: String,
    pub file: String,
    pub first_char: char,
    pub outcome: std::result::Result<ValidationReport, LoadError>,
}

#[derive(Debug, Clone, Default)]
pub struct DocsetReport {
    pub files: Vec<FileReport>,
    /// Table files on disk that the manifest does not list.
    pub orphans: Vec<String>,
}

impl DocsetReport {
    pub fn error_count(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.outcome {
                Ok(report) => report.error_count(),
                Err(_) => 1,
            })
            .sum()
    }

    pub fn warning_count(&self) -> usize {
        let issues: usize = self
            .files
            .iter()
            .filter_map(|f| f.outcome.as_ref().ok())
            .map(|r| r.warnings().count())
            .sum();
        issues + self.orphans.len()
    }

    pub fn entry_count(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.outcome.as_ref().ok())
            .map(|r| r.entries)
            .sum()
    }

    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// An opened documentation tree.
///
/// Tables are loaded on first use and kept in an LRU cache; the keyword index
/// is built on first use and kept until `clear_cache`.
pub struct Docset {
    root: PathBuf,
    search_dir: PathBuf,
    manifest: IndexManifest,
    options: DocsetOptions,
    tables: RwLock<LruCache<String, Arc<SearchTable>>>,
    keywords: RwLock<Option<Arc<KeywordIndex>>>,
}

impl std::fmt::Debug for Docset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Docset")
            .field("root", &self.root)
            .field("sections", &self.manifest.sections().len())
            .field(
                "has_keyword_index",
                &self.keywords.try_read().is_ok_and(|k| k.is_some()),
            )
            .finish_non_exhaustive()
    }
}

impl Docset {
    /// Opens a tree given either its HTML root (containing `search/`) or the
    /// `search/` directory itself.
    pub async fn open(path: impl AsRef<Path>, options: DocsetOptions) -> Result<Self> {
        let path = path.as_ref();
        let expanded = PathBuf::from(expand_tilde(&path.to_string_lossy()).as_ref());

        let (root, search_dir) = if exists(&expanded.join("search").join(MANIFEST_FILE)).await {
            (expanded.clone(), expanded.join("search"))
        } else if exists(&expanded.join(MANIFEST_FILE)).await {
            let root = expanded
                .parent()
                .map_or_else(|| expanded.clone(), Path::to_path_buf);
            (root, expanded.clone())
        } else {
            return Err(LoadError::NotFound {
                path: expanded.join("search").join(MANIFEST_FILE),
            }
            .into());
        };

        let manifest_path = search_dir.join(MANIFEST_FILE);
        let source = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| LoadError::from_io(manifest_path.clone(), &e))?;
        let manifest = IndexManifest::parse(&source)
            .with_context(|| format!("Invalid search manifest {}", manifest_path.display()))?;

        tracing::info!(
            "Opened docset {} ({} sections, {} tables)",
            root.display(),
            manifest.sections().len(),
            manifest.bucket_count()
        );

        let capacity = NonZeroUsize::new(options.cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            root,
            search_dir,
            manifest,
            options,
            tables: RwLock::new(LruCache::new(capacity)),
            keywords: RwLock::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    pub const fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub const fn options(&self) -> DocsetOptions {
        self.options
    }

    /// Loads one table file from `search/`, using the cache when possible.
    pub async fn table(&self, file: &str) -> std::result::Result<Arc<SearchTable>, LoadError> {
        if file.is_empty() || file.starts_with('.') || file.contains(['/', '\\']) {
            return Err(LoadError::InvalidFileName(file.to_string()));
        }
        if let Some(table) = self.tables.write().await.get(file) {
            tracing::trace!("Table cache hit for {}", file);
            return Ok(Arc::clone(table));
        }

        let path = self.search_dir.join(file);
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::from_io(path.clone(), &e))?;
        let table = parse_table(&source).map_err(|error| LoadError::Parse {
            path: path.clone(),
            error,
        })?;
        tracing::debug!("Loaded {} ({} entries)", path.display(), table.len());

        let table = Arc::new(table);
        self.tables
            .write()
            .await
            .put(file.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// The bucket of `section` for first character `c`, with its file name.
    /// `None` when the section has no such bucket.
    pub async fn bucket(
        &self,
        section: &str,
        c: char,
    ) -> std::result::Result<Option<(String, Arc<SearchTable>)>, LoadError> {
        let index_section = self
            .manifest
            .section(section)
            .ok_or_else(|| LoadError::UnknownSection(section.to_string()))?;
        let Some(file) = index_section.bucket_file(c) else {
            return Ok(None);
        };
        let table = self.table(&file).await?;
        Ok(Some((file, table)))
    }

    /// Every bucket of a section as `(first char, file, table)`, loaded
    /// concurrently.
    pub async fn load_section(
        &self,
        section: &str,
    ) -> std::result::Result<Vec<(char, String, Arc<SearchTable>)>, LoadError> {
        let index_section = self
            .manifest
            .section(section)
            .ok_or_else(|| LoadError::UnknownSection(section.to_string()))?;

        try_join_all(index_section.bucket_files().map(|(c, file)| async move {
            let table = self.table(&file).await?;
            Ok::<_, LoadError>((c, file, table))
        }))
        .await
    }

    /// Search-box lookup: every entry of the query's bucket whose token starts
    /// with the escaped query, in table order.
    pub async fn prefix_search(
        &self,
        section: &str,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchHit>, LoadError> {
        let normalized = normalize_query(query);
        let Some(c) = query_bucket(&normalized) else {
            return Ok(vec![]);
        };
        let Some((file, table)) = self.bucket(section, c).await? else {
            tracing::debug!("No '{}' bucket in section '{}'", c, section);
            return Ok(vec![]);
        };

        let hits = table
            .iter()
            .enumerate()
            .filter(|(_, entry)| matches_prefix(entry, &normalized))
            .take(limit)
            .map(|(position, entry)| SearchHit {
                file: file.clone(),
                position,
                entry: entry.clone(),
            })
            .collect();
        Ok(hits)
    }

    /// The keyword index over the `all` section (or every section when the
    /// manifest has no `all`). Built on first use, then reused.
    pub async fn keyword_index(&self) -> Result<Arc<KeywordIndex>> {
        if let Some(index) = self.keywords.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut slot = self.keywords.write().await;
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(self.load_keyword_index().await?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    async fn load_keyword_index(&self) -> Result<KeywordIndex> {
        let cache_path = self.search_dir.join(INDEX_CACHE_FILE);
        let digest = if self.options.keyword_index_cache {
            let digest = cache::digest_search_dir(&self.search_dir).await?;
            if let Some(index) = cache::load_index(&cache_path, digest).await {
                return Ok(index);
            }
            Some(digest)
        } else {
            None
        };

        let sections: Vec<String> = if self.manifest.section(ALL_SECTION).is_some() {
            vec![ALL_SECTION.to_string()]
        } else {
            self.manifest
                .sections()
                .iter()
                .map(|s| s.name.clone())
                .collect()
        };

        let mut tables = Vec::new();
        for section in &sections {
            for (_, file, table) in self.load_section(section).await? {
                tables.push((file, table));
            }
        }

        tracing::info!("Building keyword index for {}", self.root.display());
        let index = tokio::task::spawn_blocking(move || {
            KeywordIndex::build(tables.iter().map(|(file, table)| (file.as_str(), table.as_ref())))
        })
        .await
        .context("Keyword index task panicked")?;

        if let Some(digest) = digest
            && let Err(e) = cache::store_index(&cache_path, digest, &index).await
        {
            tracing::warn!("Failed to cache keyword index: {:#}", e);
        }
        Ok(index)
    }

    /// Keyword search, resolved back to table entries.
    pub async fn find(&self, query: &str, limit: usize) -> Result<Vec<KeywordHit>> {
        let index = self.keyword_index().await?;
        let mut hits = Vec::new();
        for found in index.search(query, limit) {
            if let Some(entry) = self.resolve(found.location).await? {
                hits.push(KeywordHit {
                    location: found.location.clone(),
                    score: found.score,
                    entry,
                });
            }
        }
        Ok(hits)
    }

    /// Labels resembling `query`.
    pub async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        Ok(self.keyword_index().await?.suggest(query, limit))
    }

    /// The entry a keyword index location points at.
    pub async fn resolve(
        &self,
        location: &EntryLocation,
    ) -> std::result::Result<Option<SearchEntry>, LoadError> {
        let table = self.table(&location.file).await?;
        Ok(table.entries().get(location.position).cloned())
    }

    /// Checks every table listed in the manifest, and looks for table files
    /// the manifest does not list.
    pub async fn validate(&self, strictness: Strictness) -> Result<DocsetReport> {
        let mut report = DocsetReport::default();

        for section in self.manifest.sections() {
            for (first_char, file) in section.bucket_files() {
                let outcome = self
                    .table(&file)
                    .await
                    .map(|table| validate_bucket(&table, first_char, strictness));
                report.files.push(FileReport {
                    section: section.name.clone(),
                    file,
                    first_char,
                    outcome,
                });
            }
        }

        let mut read_dir = tokio::fs::read_dir(&self.search_dir)
            .await
            .with_context(|| format!("Failed to list {}", self.search_dir.display()))?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_bucket_file_name(&name) && !report.files.iter().any(|f| f.file == name) {
                report.orphans.push(name);
            }
        }
        report.orphans.sort();

        tracing::info!(
            "Validated {} tables: {} errors, {} warnings",
            report.files.len(),
            report.error_count(),
            report.warning_count()
        );
        Ok(report)
    }

    /// Checks a single table file. Bucket files listed in the manifest also
    /// get the bucket-membership check.
    pub async fn validate_file(
        &self,
        file: &str,
        strictness: Strictness,
    ) -> std::result::Result<ValidationReport, LoadError> {
        let table = self.table(file).await?;

        let expected = self.manifest.sections().iter().find_map(|section| {
            section
                .bucket_files()
                .find(|(_, name)| name == file)
                .map(|(c, _)| c)
        });
        Ok(match expected {
            Some(c) => validate_bucket(&table, c, strictness),
            None => validate_table(&table, strictness),
        })
    }

    /// Drops cached tables and the keyword index, so both are rebuilt from
    /// disk on next use.
    pub async fn clear_cache(&self) {
        self.tables.write().await.clear();
        self.keywords.write().await.take();
    }

    pub async fn has_keyword_index(&self) -> bool {
        self.keywords.read().await.is_some()
    }

    pub async fn cached_tables(&self) -> usize {
        self.tables.read().await.len()
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use tempfile::TempDir;

    const MANIFEST: &str = "var indexSectionsWithContent =\n{\n  0: \"v\"\n};\n\nvar indexSectionNames =\n{\n  0: \"all\"\n};\n\nvar indexSectionLabels =\n{\n  0: \"All\"\n};\n\n";

    const TABLE: &str = "var searchData=\n[\n  ['vlbi_5finit',['vlbi_init',['../g.html#a',1,'vlbi.h']]]\n];\n";

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let search = dir.path().join("search");
        std::fs::create_dir(&search).unwrap();
        std::fs::write(search.join(MANIFEST_FILE), MANIFEST).unwrap();
        std::fs::write(search.join("all_0.js"), TABLE).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_open_from_root_or_search_dir() {
        let dir = tree();
        let_assert!(Ok(from_root) = Docset::open(dir.path(), DocsetOptions::default()).await);
        check!(from_root.search_dir() == dir.path().join("search"));

        let_assert!(
            Ok(from_search) = Docset::open(dir.path().join("search"), DocsetOptions::default()).await
        );
        check!(from_search.root() == dir.path());
    }

    #[tokio::test]
    async fn test_open_missing_tree() {
        let dir = TempDir::new().unwrap();
        let_assert!(Err(err) = Docset::open(dir.path(), DocsetOptions::default()).await);
        let_assert!(Some(LoadError::NotFound { .. }) = err.downcast_ref::<LoadError>());
    }

    #[tokio::test]
    async fn test_tables_are_cached() {
        let dir = tree();
        let docset = Docset::open(dir.path(), DocsetOptions::default()).await.unwrap();
        let first = docset.table("all_0.js").await.unwrap();
        let second = docset.table("all_0.js").await.unwrap();
        check!(Arc::ptr_eq(&first, &second));
        check!(docset.cached_tables().await == 1);

        docset.clear_cache().await;
        check!(docset.cached_tables().await == 0);
    }

    #[tokio::test]
    async fn test_unknown_section_and_missing_bucket() {
        let dir = tree();
        let docset = Docset::open(dir.path(), DocsetOptions::default()).await.unwrap();
        let_assert!(Err(LoadError::UnknownSection(name)) = docset.bucket("macros", 'v').await);
        check!(name == "macros");
        let_assert!(Ok(None) = docset.bucket(ALL_SECTION, 'q').await);
    }

    #[tokio::test]
    async fn test_table_names_stay_inside_search_dir() {
        let dir = tree();
        let docset = Docset::open(dir.path(), DocsetOptions::default()).await.unwrap();
        for name in ["../index.html", "", ".doxysearch.index", "sub/all_0.js"] {
            let_assert!(Err(LoadError::InvalidFileName(_)) = docset.table(name).await);
        }
        let_assert!(Err(LoadError::NotFound { .. }) = docset.table("all_9.js").await);
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        check!(expand_tilde("/srv/docs") == "/srv/docs");
        check!(expand_tilde("docs/~x") == "docs/~x");
    }
}
