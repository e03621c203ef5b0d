//! npm registry metadata.
//!
//! The registry returns the full package document at `{registry}/{name}`.
//! Only the top-level descriptive fields are read; version history is ignored.

use super::{ApiRequest, FetchError, Upstream, string_field, string_list};
use crate::models::InfoRecord;
use serde_json::Value;

const PLATFORM: &str = "npm";

/// Raw cache key for `package`.
#[must_use]
pub fn cache_key(package: &str) -> String {
    format!("npm-{package}")
}

/// Registry document URL. Scoped names keep their `@` and encode the `/`.
#[must_use]
pub fn package_url(registry: &str, package: &str) -> String {
    format!("{}/{}", registry.trim_end_matches('/'), package.replace('/', "%2F"))
}

/// Strips the `git+` scheme prefix and `.git` suffix npm adds to repository URLs.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn normalize_repository_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix("git+").unwrap_or(trimmed);
    let without_suffix = without_prefix.strip_suffix(".git").unwrap_or(without_prefix);

    if without_suffix.is_empty() {
        None
    } else {
        Some(without_suffix.to_string())
    }
}

/// Reads a registry document into a record.
///
/// # Errors
///
/// Returns [`FetchError::Api`] for `{"error": …}` payloads and
/// [`FetchError::Decode`] when the body is not an object.
pub fn parse_package_response(value: &Value, url: &str) -> Result<InfoRecord, FetchError> {
    let Some(document) = value.as_object() else {
        return Err(FetchError::Decode {
            url: url.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    if !document.contains_key("name") {
        if let Some(message) = document.get("error").and_then(Value::as_str) {
            return Err(FetchError::Api {
                platform: PLATFORM,
                message: message.to_string(),
            });
        }
    }

    // `repository` is either a bare string or `{ "type": "git", "url": … }`.
    let repository = match document.get("repository") {
        Some(Value::String(url)) => Some(url.as_str()),
        Some(Value::Object(repo)) => repo.get("url").and_then(Value::as_str),
        _ => None,
    };

    Ok(InfoRecord {
        description: string_field(value, "description"),
        tags: string_list(value, "keywords"),
        url: string_field(value, "homepage"),
        repo: repository.and_then(normalize_repository_url),
        title: string_field(value, "name"),
        stars: None,
    })
}

pub(crate) async fn fetch_info(upstream: &Upstream, package: &str) -> InfoRecord {
    let request = ApiRequest::new(package_url(&upstream.endpoints().npm_registry, package));
    upstream.request_cached(PLATFORM, cache_key(package), request, parse_package_response).await
}
