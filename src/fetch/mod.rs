//! Upstream metadata fetchers.
//!
//! Three sources can contribute to a catalog item:
//!
//! - [`npm`] - the package registry, looked up by package name
//! - [`github`] / [`gitlab`] - hosting platforms, looked up by a repository or
//!   homepage URL that matches the platform's address pattern
//!
//! Every fetcher returns an [`InfoRecord`]. Internally each lookup is a
//! `Result<InfoRecord, FetchError>`; at the fetcher boundary a failure is
//! logged and collapsed to [`InfoRecord::empty`], so an unreachable service can
//! never abort a build.
//!
//! # Seams
//!
//! Network access goes through the [`ApiClient`] trait. The production
//! implementation is [`HttpClient`]; tests inject an in-memory client. All
//! lookups share one [`CacheStore`] handed to [`Upstream::new`].

pub mod client;
pub mod github;
pub mod gitlab;
pub mod hosting;
pub mod npm;

pub use client::HttpClient;
pub use hosting::{HostingPlatform, RepoRef};

use crate::cache::{CacheStore, get_data};
use crate::constants::{GITHUB_API, GITLAB_API, NPM_REGISTRY};
use crate::models::InfoRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why an upstream lookup produced no data.
///
/// Never surfaces past a fetcher; kept distinct so logs say what went wrong.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    /// Connection, TLS or protocol failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded its timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The API answered with an error payload.
    #[error("{platform} API error: {message}")]
    Api {
        platform: &'static str,
        message: String,
    },

    /// The response body was not the expected shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    /// Whether retrying the same request might succeed.
    ///
    /// Network failures, timeouts, rate limiting (429) and server errors (5xx)
    /// are transient; everything else is final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Setup(_) | Self::Api { .. } | Self::Decode { .. } => false,
        }
    }
}

/// An API credential. Its `Debug` output never shows the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for building request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// How a request authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <token>` (GitHub).
    Bearer(Token),
    /// `PRIVATE-TOKEN: <token>` (GitLab).
    PrivateToken(Token),
}

/// A JSON GET request against an upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub auth: Option<Auth>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: Option<Auth>) -> Self {
        self.auth = auth;
        self
    }
}

/// Transport seam between fetchers and the network.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Performs a GET and decodes the body as JSON.
    ///
    /// Implementations must map non-success statuses to [`FetchError::Status`].
    async fn get_json(&self, request: &ApiRequest) -> Result<Value, FetchError>;
}

/// Base URLs of the upstream APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub npm_registry: String,
    pub github_api: String,
    pub gitlab_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            npm_registry: NPM_REGISTRY.to_string(),
            github_api: GITHUB_API.to_string(),
            gitlab_api: GITLAB_API.to_string(),
        }
    }
}

/// Optional per-platform credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub github: Option<Token>,
    pub gitlab: Option<Token>,
}

/// Everything a fetcher needs: transport, cache, endpoints and credentials.
///
/// Cheap to clone; clones share the client and the cache.
#[derive(Clone)]
pub struct Upstream {
    client: Arc<dyn ApiClient>,
    cache: Arc<CacheStore>,
    endpoints: Endpoints,
    credentials: Credentials,
}

impl Upstream {
    /// Creates an upstream with default endpoints and no credentials.
    #[must_use]
    pub fn new(client: Arc<dyn ApiClient>, cache: Arc<CacheStore>) -> Self {
        Self {
            client,
            cache,
            endpoints: Endpoints::default(),
            credentials: Credentials::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Registry metadata for `package`. Cached under `npm-<package>`.
    pub async fn npm_info(&self, package: &str) -> InfoRecord {
        npm::fetch_info(self, package).await
    }

    /// GitHub metadata for a repository or homepage URL.
    ///
    /// Returns the empty record without any I/O when `url` is absent, empty or
    /// not a GitHub address.
    pub async fn github_info(&self, url: Option<&str>) -> InfoRecord {
        hosting::fetch_info::<github::GitHub>(self, url).await
    }

    /// GitLab metadata for a repository or homepage URL.
    ///
    /// Returns the empty record without any I/O when `url` is absent, empty or
    /// not a GitLab address.
    pub async fn gitlab_info(&self, url: Option<&str>) -> InfoRecord {
        hosting::fetch_info::<gitlab::GitLab>(self, url).await
    }

    /// Runs a cached lookup and collapses any failure to the empty record.
    pub(crate) async fn request_cached(
        &self,
        platform: &'static str,
        raw_key: String,
        request: ApiRequest,
        parse: fn(&Value, &str) -> Result<InfoRecord, FetchError>,
    ) -> InfoRecord {
        let client = Arc::clone(&self.client);
        let outcome = get_data(&self.cache, &raw_key, move || async move {
            let value = client.get_json(&request).await?;
            parse(&value, &request.url)
        })
        .await;

        match outcome {
            Ok(record) => record,
            Err(err) => {
                debug!(
                    target: "fetch",
                    "{} lookup {} failed, using empty record: {}", platform, raw_key, err
                );
                InfoRecord::empty()
            }
        }
    }
}

/// Non-empty string field of a JSON object.
pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// String entries of an array field; missing or malformed arrays are empty.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default()
}
