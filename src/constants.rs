//! Global constants used throughout catalog-enrich.
//!
//! This module contains batch sizing, cache windows, timeouts, retry
//! parameters and upstream endpoints that are shared across modules.
//! Defining them centrally keeps magic numbers discoverable.

use std::time::Duration;

/// Number of catalog items enriched concurrently in one batch.
///
/// Batches run strictly one after another, so this is also the upper bound on
/// concurrent outbound requests per upstream.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How long a cached upstream answer is served before it is treated as a miss.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(24 * 60 * 60);

/// How long a cached upstream answer is kept on disk before it is deleted.
///
/// Must be at least [`DEFAULT_FRESHNESS`].
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Timeout for a single outbound API request (20 seconds).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Retries after the first attempt for transient upstream failures.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Starting delay for exponential backoff between request retries (200ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 200;

/// Maximum backoff delay between request retries (2 seconds).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2_000;

/// Cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".cache/catalog-enrich";

/// The catalog file the transform applies to.
pub const DEFAULT_TARGET: &str = "src/routes/components/components.json";

/// Project configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "catalog-enrich.toml";

/// npm registry metadata endpoint.
pub const NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// GitHub REST API root.
pub const GITHUB_API: &str = "https://api.github.com";

/// GitLab REST API (v4) root.
pub const GITLAB_API: &str = "https://gitlab.com/api/v4";

/// Environment variable holding a GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable holding a GitLab token.
pub const GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV: &str = "CATALOG_ENRICH_NO_PROGRESS";

/// `User-Agent` sent with every request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("catalog-enrich/", env!("CARGO_PKG_VERSION"));
