//! On-disk cache of the keyword index.
//!
//! The index is stored next to the tables it was built from, together with a
//! digest of those tables. A cached index is used only while the digest still
//! matches.

use crate::error::Result;
use crate::search::KeywordIndex;
use anyhow::Context;
use ignore::WalkBuilder;
use postcard::{from_io, to_io};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use xxhash_rust::xxh3::Xxh3;

/// File name of the cached keyword index inside `search/`.
pub const INDEX_CACHE_FILE: &str = ".doxysearch.index";

/// Bumped whenever the cached layout changes.
const CACHE_VERSION: u32 = 1;

/// 64-bit content digest, shown as 16 lowercase hex digits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Digest(u64);

impl Digest {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDigestError {
    #[error("invalid hexadecimal characters in digest")]
    InvalidHex,
    #[error("invalid digest length: expected 16 hex characters, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 16 {
            return Err(ParseDigestError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseDigestError::InvalidHex);
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseDigestError::InvalidHex)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
struct CachedIndex {
    version: u32,
    digest: Digest,
    index: KeywordIndex,
}

/// Hashes the names and contents of every `.js` file directly inside `dir`,
/// in file-name order.
pub async fn digest_search_dir(dir: &Path) -> Result<Digest> {
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<Digest> {
        let mut files: Vec<_> = WalkBuilder::new(&dir)
            .standard_filters(false)
            .max_depth(Some(1))
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "js"))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut hasher = Xxh3::new();
        for path in &files {
            if let Some(name) = path.file_name() {
                hasher.update(name.to_string_lossy().as_bytes());
                hasher.update(&[0]);
            }
            let content = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            hasher.update(&(content.len() as u64).to_le_bytes());
            hasher.update(&content);
        }

        tracing::trace!("Hashed {} search files in {}", files.len(), dir.display());
        Ok(Digest(hasher.digest()))
    })
    .await
    .context("Digest task panicked")?
}

/// Loads a cached index if it was built from tables with `digest`. A stale or
/// unreadable cache file is removed.
pub async fn load_index(path: &Path, digest: Digest) -> Option<KeywordIndex> {
    if !tokio::fs::try_exists(path).await.ok()? {
        return None;
    }

    let owned = path.to_path_buf();
    let cached = tokio::task::spawn_blocking(move || {
        let mut file = std::fs::File::open(&owned).ok()?;
        let mut buf = [0u8; 8192];
        let decoded: postcard::Result<(CachedIndex, _)> = from_io((&mut file, &mut buf));
        match decoded {
            Ok((cached, _)) => Some(cached),
            Err(e) => {
                tracing::warn!("Failed to deserialize cached index at {}: {}", owned.display(), e);
                None
            }
        }
    })
    .await
    .ok()
    .flatten();

    match cached {
        Some(cached) if cached.version == CACHE_VERSION && cached.digest == digest => {
            tracing::debug!(
                "Using cached keyword index ({} terms, digest {})",
                cached.index.term_count(),
                digest
            );
            Some(cached.index)
        }
        _ => {
            tracing::info!("Keyword index cache stale or invalid: {}", path.display());
            let _ = tokio::fs::remove_file(path).await;
            None
        }
    }
}

/// Writes `index` to `path`, replacing any previous cache file.
pub async fn store_index(path: &Path, digest: Digest, index: &KeywordIndex) -> Result<()> {
    let path = path.to_path_buf();
    let cached = CachedIndex {
        version: CACHE_VERSION,
        digest,
        index: index.clone(),
    };

    tokio::task::spawn_blocking(move || -> Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = std::fs::File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        to_io(&cached, &mut file)
            .with_context(|| format!("Failed to write keyword index to {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move keyword index to {}", path.display()))?;
        tracing::debug!("Cached keyword index to {}", path.display());
        Ok(())
    })
    .await
    .context("Index storing task panicked")?
}
