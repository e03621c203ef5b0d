//! Batched enrichment of catalog items.
//!
//! Items are processed in fixed-size batches. Inside a batch every item runs
//! as its own Tokio task; the batch completes when all of its tasks have
//! settled. Batches run one after another, which caps the number of
//! in-flight upstream requests at roughly three per item in the batch.
//!
//! ```text
//! [ 0..10 ] ──settle──▶ progress 10/23
//! [10..20 ] ──settle──▶ progress 20/23
//! [20..23 ] ──settle──▶ progress 23/23
//! ```
//!
//! Enriching an item never fails: fetchers degrade to empty records, and an
//! item whose task panics is passed through unchanged.

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::fetch::Upstream;
use crate::merge::merge;
use crate::models::CatalogItem;
use futures::future::join_all;
use tracing::{debug, warn};

/// Receives cumulative progress after each batch.
pub trait ProgressReporter: Send + Sync {
    /// `processed` items out of `total` are done.
    fn batch_completed(&self, processed: usize, total: usize);
}

/// A reporter that ignores all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn batch_completed(&self, _processed: usize, _total: usize) {}
}

/// Folds upstream metadata into catalog items.
#[derive(Clone)]
pub struct Enricher {
    upstream: Upstream,
    batch_size: usize,
}

impl Enricher {
    #[must_use]
    pub fn new(upstream: Upstream) -> Self {
        Self {
            upstream,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Enriches one item: npm first, then GitHub, then GitLab.
    ///
    /// The hosting lookups use the `repo` of the record merged so far, falling
    /// back to `url`, so a repository discovered through npm is followed up on
    /// the hosting platform. Both platforms are probed with the same URL; the
    /// one that does not recognize it contributes nothing.
    pub async fn enrich_item(&self, item: CatalogItem) -> CatalogItem {
        let mut merged = item;

        if let Some(package) = merged.npm().map(ToString::to_string) {
            let info = self.upstream.npm_info(&package).await;
            merged = merge(&merged, &info);
        }

        let github = self.upstream.github_info(merged.hosting_url()).await;
        merged = merge(&merged, &github);

        let gitlab = self.upstream.gitlab_info(merged.hosting_url()).await;
        merge(&merged, &gitlab)
    }

    /// Enriches every item, preserving order.
    ///
    /// `progress` is called once per batch with the cumulative count.
    pub async fn enrich_all(
        &self,
        items: Vec<CatalogItem>,
        progress: &dyn ProgressReporter,
    ) -> Vec<CatalogItem> {
        let total = items.len();
        let mut enriched = Vec::with_capacity(total);
        let mut pending = items.into_iter().peekable();

        while pending.peek().is_some() {
            let batch: Vec<CatalogItem> = pending.by_ref().take(self.batch_size).collect();
            let offset = enriched.len();
            debug!(target: "enrich", "Enriching items {}..{}", offset, offset + batch.len());

            let tasks = batch.iter().cloned().map(|item| {
                let enricher = self.clone();
                tokio::spawn(async move { enricher.enrich_item(item).await })
            });
            let results = join_all(tasks).await;

            for (index, (original, result)) in batch.into_iter().zip(results).enumerate() {
                match result {
                    Ok(item) => enriched.push(item),
                    Err(err) => {
                        warn!(
                            target: "enrich",
                            "Enrichment of item {} failed, keeping it unchanged: {}",
                            offset + index,
                            err
                        );
                        enriched.push(original);
                    }
                }
            }

            progress.batch_completed(enriched.len(), total);
        }

        enriched
    }
}
