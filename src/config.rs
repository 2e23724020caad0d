//! `doxysearch.toml` configuration.
//!
//! Every key is optional:
//!
//! ```toml
//! docs_root = "~/src/vlbi/docs/html"
//! strictness = "strict"
//! cache_size = 32
//! default_limit = 10
//! keyword_index = true
//! ```

use crate::error::Result;
use crate::table::Strictness;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "doxysearch.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Documentation tree opened when no path is given.
    pub docs_root: Option<PathBuf>,
    pub strictness: Strictness,
    /// Parsed tables kept in memory.
    pub cache_size: usize,
    /// Result count when a request gives none.
    pub default_limit: usize,
    /// Persist the keyword index inside `search/`.
    pub keyword_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_root: None,
            strictness: Strictness::Lenient,
            cache_size: 32,
            default_limit: 10,
            keyword_index: true,
        }
    }
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse configuration")?;
        if config.cache_size == 0 {
            anyhow::bail!("cache_size must be at least 1");
        }
        Ok(config)
    }

    /// Reads `path`, which must exist.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&source).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Loads `explicit` if given, otherwise the first existing file from
    /// [`candidate_paths`], otherwise the defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path).await;
        }

        let cwd = std::env::current_dir().ok();
        for path in candidate_paths(cwd.as_deref(), dirs::config_dir().as_deref()) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::debug!("Loading configuration from {}", path.display());
                return Self::from_file(&path).await;
            }
        }

        Ok(Self::default())
    }
}

/// Where a configuration file is looked for, in order.
pub fn candidate_paths(cwd: Option<&Path>, config_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(cwd) = cwd {
        paths.push(cwd.join(CONFIG_FILE));
    }
    if let Some(dir) = config_dir {
        paths.push(dir.join("doxysearch").join(CONFIG_FILE));
    }
    paths
}
