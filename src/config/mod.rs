//! Configuration for catalog-enrich
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults ([`EnrichConfig::default`])
//! 2. A TOML file: `catalog-enrich.toml` in the working directory, or the
//!    path passed with `--config`
//! 3. Environment tokens (`GITHUB_TOKEN`, `GITLAB_TOKEN`) and CLI flags
//!
//! # Example
//!
//! ```toml
//! target = "src/routes/components/components.json"
//! exclude = ["**/drafts/**"]
//! cache_dir = ".cache/catalog-enrich"
//! batch_size = 10
//! freshness_hours = 24
//! retention_hours = 168
//! request_timeout_secs = 20
//! max_retries = 2
//! ```
//!
//! Tokens may be written to the file but are better supplied through the
//! environment so they stay out of version control. They are never logged;
//! the `Debug` output of [`EnrichConfig`] redacts them.

use crate::cache::ExpiryPolicy;
use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, DEFAULT_CACHE_DIR, DEFAULT_FRESHNESS, DEFAULT_MAX_RETRIES,
    DEFAULT_RETENTION, DEFAULT_TARGET, GITHUB_API, GITHUB_TOKEN_ENV, GITLAB_API, GITLAB_TOKEN_ENV,
    NPM_REGISTRY, REQUEST_TIMEOUT,
};
use crate::core::EnrichError;
use crate::fetch::{Credentials, Endpoints, Token};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

const SECS_PER_HOUR: u64 = 60 * 60;

/// All settings of an enrichment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    /// Catalog path the transform applies to; other ids pass through.
    pub target: String,
    /// Glob patterns an id must match (any) to be transformed. Empty means all.
    pub include: Vec<String>,
    /// Glob patterns that exclude an id even if it matches `target`.
    pub exclude: Vec<String>,
    /// Cache directory, relative to the working directory unless absolute.
    pub cache_dir: PathBuf,
    /// Items enriched concurrently per batch.
    pub batch_size: usize,
    /// Hours a cached answer is served.
    pub freshness_hours: u64,
    /// Hours a cached answer is kept on disk.
    pub retention_hours: u64,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<Token>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitlab_token: Option<Token>,
    pub npm_registry: String,
    pub github_api: String,
    pub gitlab_api: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            freshness_hours: DEFAULT_FRESHNESS.as_secs() / SECS_PER_HOUR,
            retention_hours: DEFAULT_RETENTION.as_secs() / SECS_PER_HOUR,
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            github_token: None,
            gitlab_token: None,
            npm_registry: NPM_REGISTRY.to_string(),
            github_api: GITHUB_API.to_string(),
            gitlab_api: GITLAB_API.to_string(),
        }
    }
}

impl EnrichConfig {
    /// Loads configuration from `path`, or from `catalog-enrich.toml` in the
    /// working directory when no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error. The result is validated.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::ConfigNotFound`] if `path` is given but does not exist
    /// - the file cannot be read or is not valid TOML for this schema
    /// - validation fails (see [`EnrichConfig::validate`])
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(EnrichError::ConfigNotFound {
                        path: path.display().to_string(),
                    }
                    .into());
                }
                Self::load_from(path).await?
            }
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load_from(default_path).await?
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses the TOML file at `path` without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(EnrichError::from)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overlays `GITHUB_TOKEN` / `GITLAB_TOKEN` from the process environment.
    #[must_use]
    pub fn with_env_tokens(self) -> Self {
        self.with_tokens_from(|name| std::env::var(name).ok())
    }

    /// Overlays tokens from `lookup`; unset or blank values leave the field as is.
    #[must_use]
    pub fn with_tokens_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty()).map(Token::new);

        if let Some(token) = read(GITHUB_TOKEN_ENV) {
            self.github_token = Some(token);
        }
        if let Some(token) = read(GITLAB_TOKEN_ENV) {
            self.gitlab_token = Some(token);
        }
        self
    }

    /// Checks value ranges and filter syntax.
    ///
    /// # Errors
    ///
    /// - [`EnrichError::ConfigError`] for a zero batch size or timeout, or a
    ///   freshness window longer than the retention window
    /// - [`EnrichError::InvalidFilter`] for a pattern that is not a valid glob
    pub fn validate(&self) -> Result<(), EnrichError> {
        if self.batch_size == 0 {
            return Err(EnrichError::ConfigError {
                message: "batch_size must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(EnrichError::ConfigError {
                message: "request_timeout_secs must be at least 1".to_string(),
            });
        }
        if self.freshness_hours > self.retention_hours {
            return Err(EnrichError::ConfigError {
                message: format!(
                    "freshness_hours ({}) must not exceed retention_hours ({})",
                    self.freshness_hours, self.retention_hours
                ),
            });
        }

        for pattern in self.include.iter().chain(&self.exclude) {
            glob::Pattern::new(pattern).map_err(|err| EnrichError::InvalidFilter {
                pattern: pattern.clone(),
                reason: err.msg.to_string(),
            })?;
        }

        Ok(())
    }

    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy {
            freshness: Duration::from_secs(self.freshness_hours.saturating_mul(SECS_PER_HOUR)),
            retention: Duration::from_secs(self.retention_hours.saturating_mul(SECS_PER_HOUR)),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            npm_registry: self.npm_registry.clone(),
            github_api: self.github_api.clone(),
            gitlab_api: self.gitlab_api.clone(),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            github: self.github_token.clone(),
            gitlab: self.gitlab_token.clone(),
        }
    }
}
