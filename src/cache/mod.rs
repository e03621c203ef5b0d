//! Persistent cache for upstream metadata.
//!
//! Enrichment runs on every site build, but npm, GitHub and GitLab answers
//! change slowly and the hosting APIs are rate limited. Every fetcher
//! therefore goes through [`get_data`], which consults a [`CacheStore`]
//! before calling out.
//!
//! # Layers
//!
//! - [`normalize_key`] - raw lookup identifier → file-name-safe key
//! - [`CacheStore`] - one JSON file per key with freshness and retention windows
//! - [`get_data`] - read-through wrapper around an async producer
//!
//! # Failure policy
//!
//! | fault | effect |
//! |-------|--------|
//! | read fault (missing, corrupt, stale) | treated as a miss |
//! | producer failure | returned to the caller, nothing stored |
//! | write fault | logged at `warn`, computed value still returned |
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_enrich::cache::{CacheStore, ExpiryPolicy, get_data};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = CacheStore::open(".cache/catalog-enrich", ExpiryPolicy::default())?;
//!
//! let stars: u64 = get_data(&store, "github-sveltejs-kit", || async {
//!     Ok::<_, std::io::Error>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod key;
mod store;

pub use key::normalize_key;
pub use store::{CacheStats, CacheStore, ExpiryPolicy, PruneStats};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by [`CacheStore`] construction and writes.
///
/// Reads never produce errors; see [`CacheStore::get`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The freshness window is longer than the retention window.
    #[error("cache freshness window ({freshness:?}) exceeds retention window ({retention:?})")]
    InvalidPolicy {
        freshness: Duration,
        retention: Duration,
    },

    /// A file system operation on the cache directory failed.
    #[error("cache {operation} failed for {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache entry could not be serialized.
    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The blocking write task panicked or was cancelled.
    #[error("cache write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Read-through cache wrapper.
///
/// Normalizes `raw_key`, returns the cached value when a fresh entry exists and
/// deserializes cleanly, and otherwise runs `producer`. A successful result is
/// stored best-effort; a failed one is returned without touching the cache, so
/// a transient upstream outage is retried on the next build instead of being
/// remembered for the whole freshness window.
///
/// # Errors
///
/// Returns the producer's error when the cache misses and the producer fails.
pub async fn get_data<T, E, F, Fut>(store: &CacheStore, raw_key: &str, producer: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let key = normalize_key(raw_key);

    if let Some(text) = store.get(&key).await {
        match serde_json::from_str::<T>(&text) {
            Ok(value) => {
                debug!(target: "cache", "Cache hit for {}", raw_key);
                return Ok(value);
            }
            Err(err) => {
                debug!(target: "cache", "Discarding undecodable cache entry {}: {}", raw_key, err);
            }
        }
    } else {
        debug!(target: "cache", "Cache miss for {}", raw_key);
    }

    let value = producer().await?;

    match serde_json::to_string(&value) {
        Ok(text) => {
            if let Err(err) = store.set(&key, text).await {
                warn!(target: "cache", "Failed to cache {}: {}", raw_key, err);
            }
        }
        Err(err) => warn!(target: "cache", "Failed to serialize {} for caching: {}", raw_key, err),
    }

    Ok(value)
}
