//! File-backed response cache.
//!
//! One entry per file under the cache directory; the file name is the
//! [`key::cache_key`] and the body is the serialized [`LlmResponse`]. Entries
//! never expire. Clear the cache whenever scoring logic changes, since a key only
//! covers the request side.

pub mod key;

use crate::errors::CacheError;
use crate::model::LlmResponse;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub bytes: u64,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// A cache that always misses and never writes.
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Looks up `key`. I/O and decode failures are logged and reported as a miss.
    pub async fn lookup(&self, key: &str) -> Option<LlmResponse> {
        if !self.enabled {
            return None;
        }
        match self.try_lookup(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    pub async fn try_lookup(&self, key: &str) -> Result<Option<LlmResponse>, CacheError> {
        let path = self.entry_path(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        let resp = serde_json::from_slice(&raw).map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(resp))
    }

    /// Stores `resp` under `key`. Failures are logged; the run continues uncached.
    pub async fn store(&self, key: &str, resp: &LlmResponse) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.try_store(key, resp).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }

    pub async fn try_store(&self, key: &str, resp: &LlmResponse) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let body = serde_json::to_vec_pretty(resp).map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })?;

        // Write-then-rename so a concurrent reader never sees a partial entry.
        let path = self.entry_path(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|source| CacheError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| CacheError::Io { path, source })?;
        Ok(())
    }

    /// Removes every entry. Returns how many were deleted.
    pub async fn clear(&self) -> Result<u64, CacheError> {
        let mut removed = 0;
        for path in self.entry_paths().await? {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
            removed += 1;
        }
        tracing::info!(dir = %self.dir.display(), removed, "cache cleared");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        for path in self.entry_paths().await? {
            let meta = tokio::fs::metadata(&path)
                .await
                .map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
            stats.entries += 1;
            stats.bytes += meta.len();
        }
        Ok(stats)
    }

    /// Only files named like a [`key::cache_key`] are entries; anything else in
    /// the directory is left alone.
    async fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut out = Vec::new();
        if !self.enabled {
            return Ok(out);
        }
        let mut rd = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        while let Some(entry) = rd.next_entry().await.map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })? {
            let path = entry.path();
            let is_entry = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(key::is_cache_key);
            if is_entry && path.is_file() {
                out.push(path);
            }
        }
        Ok(out)
    }
}
