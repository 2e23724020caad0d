//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every docset test gets a fresh temporary directory holding an HTML tree
//! whose `search/` directory is generated from `tests/fixtures/vlbi_symbols.json`,
//! and its own `DocsetState` with an empty table cache. No keyword index cache
//! file exists until a test builds one.
//!
//! # Available Fixtures
//!
//! - `vlbi_docset`: the generated vlbi tree, already opened
//! - `empty_state`: a `DocsetState` with no docset configured

use doxysearch_mcp::builder::SymbolRecord;
use doxysearch_mcp::{Config, DocsetState, TableBuilder};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

#[allow(dead_code)] // Used across different integration test crates
pub fn fixture_path(name: &str) -> PathBuf {
    project_root().join("tests/fixtures").join(name)
}

/// The `all_f.js` table as generated for the vlbi library.
#[allow(dead_code)] // Used across different integration test crates
pub fn vlbi_table_source() -> String {
    std::fs::read_to_string(fixture_path("all_f.js")).expect("Failed to read all_f.js fixture")
}

/// The symbol list the vlbi tables were generated from, in no particular order.
#[allow(dead_code)] // Used across different integration test crates
pub fn vlbi_symbols() -> Vec<SymbolRecord> {
    let source = std::fs::read_to_string(fixture_path("vlbi_symbols.json"))
        .expect("Failed to read vlbi_symbols.json fixture");
    serde_json::from_str(&source).expect("Invalid vlbi_symbols.json fixture")
}

/// A temporary directory for test isolation, removed on drop.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a directory (and all parent directories) within this workspace.
    ///
    /// # Panics
    /// Panics if directory creation fails.
    pub fn create_dir(&self, path: &str) {
        let full_path = self.root.join(path);
        std::fs::create_dir_all(&full_path)
            .unwrap_or_else(|e| panic!("Failed to create directory '{}': {}", path, e));
    }

    /// Creates a file with the given content, creating parent directories.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A generated vlbi HTML tree (`html/search/...`) opened in a fresh state.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct VlbiDocset {
    workspace: TempWorkspace,
    pub state: Arc<DocsetState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl VlbiDocset {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let workspace = TempWorkspace::new();
        workspace.create_dir("html/search");
        let html = workspace.path().join("html");

        let built = vlbi_symbols().into_iter().collect::<TableBuilder>().build();
        let state = Arc::new(DocsetState::new(config));

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                built
                    .write_to_dir(&html.join("search"))
                    .await
                    .expect("Failed to write vlbi search tables");
                state
                    .open(&html)
                    .await
                    .expect("Failed to open vlbi docset");
            });
        });

        Self { workspace, state }
    }

    /// The HTML root, containing `search/`.
    pub fn html(&self) -> PathBuf {
        self.workspace.path().join("html")
    }

    pub fn search_dir(&self) -> PathBuf {
        self.html().join("search")
    }
}

impl Default for VlbiDocset {
    fn default() -> Self {
        Self::new()
    }
}

/// The vlbi docset, opened. Needs a multi-threaded runtime.
#[allow(dead_code)] // Used across different integration test crates
#[fixture]
pub fn vlbi_docset() -> VlbiDocset {
    VlbiDocset::new()
}

/// A state with no docset configured.
#[allow(dead_code)] // Used across different integration test crates
#[fixture]
pub fn empty_state() -> Arc<DocsetState> {
    Arc::new(DocsetState::new(Config::default()))
}
