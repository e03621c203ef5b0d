//! Directory-backed key/value store with freshness and retention windows.
//!
//! Each entry is one JSON file named after its (already normalized) key:
//!
//! ```json
//! {
//!   "key": "npm-svelte",
//!   "data": "{\"tags\":[],\"title\":\"svelte\"}",
//!   "created_at": "2026-10-16T09:12:44Z"
//! }
//! ```
//!
//! Two windows govern an entry's life:
//!
//! - **freshness** - after this age [`CacheStore::get`] treats the entry as a miss
//! - **retention** - after this age the file is deleted, either lazily by `get`
//!   or eagerly by [`CacheStore::prune`]
//!
//! Reads never fail: a missing, unreadable or corrupt entry is a miss.

use super::CacheError;
use crate::utils::fs::{atomic_write, ensure_dir};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

const ENTRY_EXTENSION: &str = "json";

/// Freshness and retention windows for cached entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Entries older than this are served as misses.
    pub freshness: Duration,
    /// Entries older than this are deleted.
    pub retention: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            freshness: crate::constants::DEFAULT_FRESHNESS,
            retention: crate::constants::DEFAULT_RETENTION,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    data: String,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Result of a [`CacheStore::prune`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Entries removed because they outlived the retention window.
    pub expired: usize,
    /// Entries removed because they could not be read or parsed.
    pub corrupt: usize,
    /// Entries left in place.
    pub kept: usize,
}

/// Snapshot of the cache directory for `catalog-enrich cache info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries within the freshness window.
    pub fresh: usize,
    /// Entries past freshness but still retained.
    pub stale: usize,
    /// Entries past retention, awaiting pruning.
    pub expired: usize,
    /// Files that are not valid entries.
    pub corrupt: usize,
    /// Total size of all entry files in bytes.
    pub bytes: u64,
}

/// The persistent cache shared by every fetcher in one pipeline run.
///
/// Safe to share behind an [`Arc`](std::sync::Arc): entries for different keys
/// live in different files, and writes to the same key are atomic renames, so
/// the last writer wins without corrupting the entry.
#[derive(Debug)]
pub struct CacheStore {
    dir: PathBuf,
    policy: ExpiryPolicy,
}

impl CacheStore {
    /// Opens (and creates if needed) the cache directory.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidPolicy`] if freshness exceeds retention
    /// - [`CacheError::Io`] if the directory cannot be created
    pub fn open(dir: impl Into<PathBuf>, policy: ExpiryPolicy) -> Result<Self, CacheError> {
        if policy.freshness > policy.retention {
            return Err(CacheError::InvalidPolicy {
                freshness: policy.freshness,
                retention: policy.retention,
            });
        }

        let dir = dir.into();
        ensure_dir(&dir).map_err(|source| CacheError::Io {
            operation: "create directory",
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            policy,
        })
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Reads a fresh entry.
    ///
    /// Returns `None` on any miss: absent, unreadable, corrupt, stale or past
    /// retention. Entries past retention are deleted on the way out.
    pub async fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    debug!(target: "cache", "Unreadable cache entry {}: {}", path.display(), err);
                }
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(target: "cache", "Corrupt cache entry {}: {}", path.display(), err);
                return None;
            }
        };

        if entry.key != key {
            debug!(target: "cache", "Cache entry {} belongs to key {}", path.display(), entry.key);
            return None;
        }

        let age = entry.age(Utc::now());
        if age >= self.policy.retention {
            debug!(target: "cache", "Removing expired cache entry {}", key);
            let _ = fs::remove_file(&path).await;
            return None;
        }
        if age >= self.policy.freshness {
            debug!(target: "cache", "Cache entry {} is stale", key);
            return None;
        }

        Some(entry.data)
    }

    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be serialized or written.
    pub async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.set_at(key, value, Utc::now()).await
    }

    pub(crate) async fn set_at(
        &self,
        key: &str,
        value: String,
        created_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            key: key.to_string(),
            data: value,
            created_at,
        };
        let content = serde_json::to_vec_pretty(&entry)?;
        let path = self.entry_path(key);

        let target = path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&target, &content))
            .await?
            .map_err(|source| CacheError::Io {
                operation: "write entry",
                path,
                source,
            })
    }

    /// Deletes entries past retention and entries that cannot be parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed. Failures to delete
    /// individual files are logged and counted as kept.
    pub async fn prune(&self) -> Result<PruneStats, CacheError> {
        let now = Utc::now();
        let mut stats = PruneStats::default();

        for path in self.entry_files().await? {
            let corrupt = match read_entry(&path).await {
                Some(entry) if entry.age(now) < self.policy.retention => {
                    stats.kept += 1;
                    continue;
                }
                Some(_) => false,
                None => true,
            };

            if let Err(err) = fs::remove_file(&path).await {
                debug!(target: "cache", "Failed to remove {}: {}", path.display(), err);
                stats.kept += 1;
            } else if corrupt {
                stats.corrupt += 1;
            } else {
                stats.expired += 1;
            }
        }

        Ok(stats)
    }

    /// Deletes every entry, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file cannot be removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            fs::remove_file(&path).await.map_err(|source| CacheError::Io {
                operation: "remove entry",
                path: path.clone(),
                source,
            })?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Classifies every entry by age without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Utc::now();
        let mut stats = CacheStats::default();

        for path in self.entry_files().await? {
            if let Ok(metadata) = fs::metadata(&path).await {
                stats.bytes += metadata.len();
            }
            match read_entry(&path).await {
                None => stats.corrupt += 1,
                Some(entry) => {
                    let age = entry.age(now);
                    if age >= self.policy.retention {
                        stats.expired += 1;
                    } else if age >= self.policy.freshness {
                        stats.stale += 1;
                    } else {
                        stats.fresh += 1;
                    }
                }
            }
        }

        Ok(stats)
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let io_error = |source| CacheError::Io {
            operation: "list directory",
            path: self.dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(io_error)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn read_entry(path: &Path) -> Option<CacheEntry> {
    let content = fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}
