//! Session state shared by the MCP server and the CLI.

use crate::config::Config;
use crate::docset::{Docset, DocsetOptions};
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The active documentation tree, plus the configuration used to open it.
pub struct DocsetState {
    config: Config,
    docset: RwLock<Option<Arc<Docset>>>,
}

impl std::fmt::Debug for DocsetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsetState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocsetState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            docset: RwLock::new(None),
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> DocsetOptions {
        DocsetOptions::from(&self.config)
    }

    pub async fn docset(&self) -> Option<Arc<Docset>> {
        self.docset.read().await.clone()
    }

    /// The active docset, or a message telling the caller how to set one.
    pub async fn require_docset(&self) -> std::result::Result<Arc<Docset>, String> {
        self.docset().await.ok_or_else(|| {
            "No documentation tree configured.\n\n\
             Use set_docset with the path of a generated HTML directory \
             (the one containing search/), or set docs_root in doxysearch.toml."
                .to_string()
        })
    }

    /// Opens `path` and makes it the active docset. Returns the previous one.
    pub async fn open(&self, path: &Path) -> Result<Option<Arc<Docset>>> {
        let docset = Docset::open(path, self.options()).await?;
        Ok(self.replace(docset).await)
    }

    pub async fn replace(&self, docset: Docset) -> Option<Arc<Docset>> {
        self.docset.write().await.replace(Arc::new(docset))
    }

    /// Opens `docs_root` from the configuration, if one is set. A tree that
    /// fails to open is logged and left unset.
    pub async fn open_configured(&self) -> bool {
        let Some(root) = self.config.docs_root.clone() else {
            return false;
        };
        match self.open(&root).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Could not open configured docs_root {}: {:#}", root.display(), e);
                false
            }
        }
    }
}
