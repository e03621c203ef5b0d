//! Test utilities for catalog-enrich
//!
//! This module provides an in-memory [`ApiClient`], canned upstream payloads
//! and helpers for building an [`Upstream`] over a temporary cache directory.
//! Nothing here touches the network.
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_enrich::test_utils::{FakeApi, fixtures, test_upstream};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let temp = tempfile::TempDir::new().unwrap();
//! let api = Arc::new(
//!     FakeApi::new().with_json(fixtures::npm_url("svelte"), fixtures::npm_package("svelte")),
//! );
//! let upstream = test_upstream(api.clone(), temp.path());
//!
//! let record = upstream.npm_info("svelte").await;
//! assert_eq!(record.title.as_deref(), Some("svelte"));
//! assert_eq!(api.call_count(), 1);
//! # }
//! ```

pub mod fixtures;

use crate::cache::{CacheStore, ExpiryPolicy};
use crate::fetch::{ApiClient, ApiRequest, Endpoints, FetchError, Upstream};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, Once, PoisonError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// What [`FakeApi`] answers for a URL.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// A successful JSON body.
    Json(Value),
    /// A non-success HTTP status.
    Status(u16),
    /// Panics inside the request, simulating a crashing task.
    Panic,
}

/// In-memory [`ApiClient`] with canned responses keyed by exact URL.
///
/// Unknown URLs answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct FakeApi {
    responses: HashMap<String, FakeResponse>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, response: FakeResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    #[must_use]
    pub fn with_json(self, url: impl Into<String>, body: Value) -> Self {
        self.with_response(url, FakeResponse::Json(body))
    }

    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.with_response(url, FakeResponse::Status(status))
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// URLs requested so far, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn get_json(&self, request: &ApiRequest) -> Result<Value, FetchError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());

        match self.responses.get(&request.url) {
            Some(FakeResponse::Json(body)) => Ok(body.clone()),
            Some(FakeResponse::Status(status)) => Err(FetchError::Status {
                url: request.url.clone(),
                status: *status,
            }),
            Some(FakeResponse::Panic) => panic!("fake upstream crashed on {}", request.url),
            None => Err(FetchError::Status {
                url: request.url.clone(),
                status: 404,
            }),
        }
    }
}

/// Endpoints on reserved `.test` hosts, matching the URLs in [`fixtures`].
#[must_use]
pub fn test_endpoints() -> Endpoints {
    Endpoints {
        npm_registry: fixtures::NPM_REGISTRY.to_string(),
        github_api: fixtures::GITHUB_API.to_string(),
        gitlab_api: fixtures::GITLAB_API.to_string(),
    }
}

/// An [`Upstream`] over `api` with its cache in `cache_dir`.
///
/// # Panics
///
/// Panics if the cache directory cannot be created.
#[must_use]
pub fn test_upstream(api: Arc<dyn ApiClient>, cache_dir: &Path) -> Upstream {
    let store = CacheStore::open(cache_dir, ExpiryPolicy::default())
        .unwrap_or_else(|err| panic!("failed to open test cache: {err}"));
    Upstream::new(api, Arc::new(store)).with_endpoints(test_endpoints())
}
