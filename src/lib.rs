//! catalog-enrich - build-time enrichment of component catalogs
//!
//! A site keeps a hand-written catalog of components as a JSON array. Each
//! entry may name an npm package, a repository URL or a homepage. At build
//! time this crate fills in descriptions, tags, star counts and links from
//! the npm registry, GitHub and GitLab, and writes the catalog back out.
//!
//! # Architecture Overview
//!
//! ```text
//! pipeline ── TargetFilter ──▶ parse ──▶ enrich ──▶ serialize
//!                                          │
//!                      ┌───────────────────┼───────────────────┐
//!                   fetch::npm       fetch::github       fetch::gitlab
//!                      └──────── cache::get_data ──────────────┘
//!                                          │
//!                                   fetch::ApiClient
//! ```
//!
//! - [`pipeline`] - decides which module is the catalog and runs the transform
//! - [`enrich`] - batched, concurrent per-item enrichment with progress
//! - [`merge`] - precedence rules for folding upstream data into an item
//! - [`fetch`] - npm / GitHub / GitLab fetchers over an [`fetch::ApiClient`]
//! - [`cache`] - persistent on-disk cache with freshness and retention
//! - [`models`] - [`models::CatalogItem`] and [`models::InfoRecord`]
//! - [`config`] - TOML + environment configuration
//! - [`cli`] - the `catalog-enrich` command
//! - [`core`] - error types and user-facing error rendering
//! - [`utils`] - atomic file writes and the progress bar
//!
//! # Failure Model
//!
//! Enrichment is best-effort. An unreachable upstream, an unknown package or
//! a rate limit yields an empty record for that source and the item keeps
//! whatever it already had. Only configuration problems and unreadable or
//! unwritable files are errors.
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_enrich::config::EnrichConfig;
//! use catalog_enrich::enrich::NoProgress;
//! use catalog_enrich::fetch::HttpClient;
//! use catalog_enrich::pipeline::{Pipeline, TransformOutcome};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EnrichConfig::load(None).await?.with_env_tokens();
//! let client = HttpClient::new(config.request_timeout())?;
//! let pipeline = Pipeline::from_config(&config, Arc::new(client))?;
//!
//! let source = std::fs::read_to_string(&config.target)?;
//! if let TransformOutcome::Transformed(output) =
//!     pipeline.transform(&source, &config.target, &NoProgress).await?
//! {
//!     std::fs::write(&config.target, output.code)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod enrich;
pub mod fetch;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
