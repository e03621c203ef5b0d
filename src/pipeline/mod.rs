//! Catalog transform entry point.
//!
//! A build tool hands every module it loads to [`Pipeline::transform`] as
//! `(source, id)`. Only the catalog file is touched:
//!
//! ```text
//! id matches target? ──no──▶ Skipped
//!        │ yes
//! parse JSON array ──fail──▶ Malformed (warning with position)
//!        │ ok
//! enrich in batches ──────▶ Transformed (pretty JSON + newline)
//! ```
//!
//! A malformed catalog is never fatal: the warning tells the author where to
//! look and the build continues with the file untransformed.

use crate::cache::CacheStore;
use crate::config::EnrichConfig;
use crate::core::EnrichError;
use crate::enrich::{Enricher, ProgressReporter};
use crate::fetch::{ApiClient, Upstream};
use crate::models::CatalogItem;
use glob::Pattern;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Decides which module ids are the catalog.
///
/// An id matches when it equals the target path or ends with `/<target>`,
/// matches at least one include pattern (if any are set) and no exclude
/// pattern. Backslashes are treated as `/` and query suffixes (`?raw`) are
/// ignored.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    target: String,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TargetFilter {
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: normalize_id(target).trim_start_matches("./").to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Builds the filter from the configured target and glob lists.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::InvalidFilter`] if a pattern is not a valid glob.
    pub fn from_config(config: &EnrichConfig) -> Result<Self, EnrichError> {
        Ok(Self {
            include: compile(&config.include)?,
            exclude: compile(&config.exclude)?,
            ..Self::new(&config.target)
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        let id = normalize_id(id);
        let id = id.as_str();

        let is_target = id == self.target
            || id.strip_suffix(self.target.as_str()).is_some_and(|prefix| prefix.ends_with('/'));

        is_target
            && (self.include.is_empty() || self.include.iter().any(|pattern| pattern.matches(id)))
            && !self.exclude.iter().any(|pattern| pattern.matches(id))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, EnrichError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|err| EnrichError::InvalidFilter {
                pattern: pattern.clone(),
                reason: err.msg.to_string(),
            })
        })
        .collect()
}

fn normalize_id(id: &str) -> String {
    let without_query = id.split_once('?').map_or(id, |(path, _)| path);
    without_query.replace('\\', "/")
}

/// A catalog that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWarning {
    /// The module id that was being transformed.
    pub id: String,
    /// Approximate character offset of the parse failure.
    pub position: usize,
    /// Parser message.
    pub message: String,
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse catalog {} at position {}: {}",
            self.id, self.position, self.message
        )
    }
}

/// The enriched catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Re-serialized catalog: pretty JSON with a trailing newline.
    pub code: String,
    /// Number of catalog items processed.
    pub items: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The id is not the catalog; leave the module alone.
    Skipped,
    /// The catalog is not a JSON array of objects; leave the module alone.
    Malformed(CatalogWarning),
    Transformed(TransformOutput),
}

/// Filter plus enricher: everything needed to transform a catalog module.
#[derive(Clone)]
pub struct Pipeline {
    enricher: Enricher,
    filter: TargetFilter,
}

impl Pipeline {
    #[must_use]
    pub fn new(enricher: Enricher, filter: TargetFilter) -> Self {
        Self { enricher, filter }
    }

    /// Wires cache, endpoints, credentials and batch size from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache directory
    /// cannot be created.
    pub fn from_config(config: &EnrichConfig, client: Arc<dyn ApiClient>) -> Result<Self, EnrichError> {
        config.validate()?;

        let store = CacheStore::open(&config.cache_dir, config.expiry_policy())?;
        let upstream = Upstream::new(client, Arc::new(store))
            .with_endpoints(config.endpoints())
            .with_credentials(config.credentials());
        let enricher = Enricher::new(upstream).with_batch_size(config.batch_size);

        Ok(Self::new(enricher, TargetFilter::from_config(config)?))
    }

    #[must_use]
    pub fn filter(&self) -> &TargetFilter {
        &self.filter
    }

    /// Transforms the module `id` with contents `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError::JsonError`] only if the enriched catalog cannot
    /// be serialized. Parse failures are reported as
    /// [`TransformOutcome::Malformed`].
    pub async fn transform(
        &self,
        source: &str,
        id: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<TransformOutcome, EnrichError> {
        if !self.filter.matches(id) {
            debug!("Skipping {}", id);
            return Ok(TransformOutcome::Skipped);
        }

        let items: Vec<CatalogItem> = match serde_json::from_str(source) {
            Ok(items) => items,
            Err(err) => {
                let warning = CatalogWarning {
                    id: id.to_string(),
                    position: error_position(source, &err),
                    message: err.to_string(),
                };
                warn!("{}", warning);
                return Ok(TransformOutcome::Malformed(warning));
            }
        };

        let count = items.len();
        let start = Instant::now();
        let enriched = self.enricher.enrich_all(items, progress).await;
        let elapsed = start.elapsed();
        info!("Enriched {} catalog items in {}", count, format_duration(elapsed));

        let mut code = serde_json::to_string_pretty(&enriched)?;
        code.push('\n');

        Ok(TransformOutcome::Transformed(TransformOutput {
            code,
            items: count,
            elapsed,
        }))
    }
}

/// Character offset of a parse error, derived from its line and column.
///
/// The parser reports columns in bytes, so the byte offset is computed first
/// and then converted to characters.
#[must_use]
pub fn error_position(source: &str, err: &serde_json::Error) -> usize {
    let preceding: usize = source
        .split('\n')
        .take(err.line().saturating_sub(1))
        .map(|line| line.len() + 1)
        .sum();
    let mut byte = (preceding + err.column().saturating_sub(1)).min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    source[..byte].chars().count()
}

/// `850ms`, `4.20s` or `2m 05s`.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else if secs >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
