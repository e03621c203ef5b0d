//! Shared lookup flow for source hosting platforms.
//!
//! GitHub and GitLab differ only in how a repository URL is recognized, how
//! the API request is built and how the response is read. Each platform
//! implements [`HostingPlatform`]; [`fetch_info`] runs the common steps.

use super::{ApiRequest, FetchError, Upstream};
use crate::models::InfoRecord;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Owner and repository name extracted from a hosting URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

/// A source hosting platform that can describe a repository.
pub trait HostingPlatform {
    /// Short lowercase name, used in cache keys and logs.
    const NAME: &'static str;

    /// Extracts the repository from `url`, or `None` if it is not this platform's.
    fn repo_ref(url: &str) -> Option<RepoRef>;

    /// The API request describing `repo`.
    fn request(upstream: &Upstream, repo: &RepoRef) -> ApiRequest;

    /// Reads the API response into a record.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Api`] for error payloads and
    /// [`FetchError::Decode`] for bodies of the wrong shape.
    fn parse(value: &Value, url: &str) -> Result<InfoRecord, FetchError>;

    /// Raw cache key: `<platform>-<owner>-<name>`.
    fn cache_key(repo: &RepoRef) -> String {
        format!("{}-{}-{}", Self::NAME, repo.owner, repo.name)
    }
}

/// Looks `url` up on platform `P`.
///
/// Absent, blank and foreign URLs produce the empty record without touching
/// the cache or the network.
pub(crate) async fn fetch_info<P: HostingPlatform>(
    upstream: &Upstream,
    url: Option<&str>,
) -> InfoRecord {
    let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
        return InfoRecord::empty();
    };
    let Some(repo) = P::repo_ref(url) else {
        debug!(target: "fetch", "{} is not a {} repository, skipping", url, P::NAME);
        return InfoRecord::empty();
    };

    upstream
        .request_cached(P::NAME, P::cache_key(&repo), P::request(upstream, &repo), P::parse)
        .await
}

/// Applies a two-group URL pattern and strips a trailing `.git`.
pub(crate) fn capture_repo(pattern: Option<&Regex>, url: &str) -> Option<RepoRef> {
    let captures = pattern?.captures(url)?;
    let owner = captures.get(1)?.as_str();
    let name = captures.get(2)?.as_str();
    let name = name.strip_suffix(".git").unwrap_or(name);

    if owner.is_empty() || name.is_empty() || name == "." || name == ".." {
        return None;
    }

    Some(RepoRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

/// Rejects non-object bodies and recognized error payloads.
pub(crate) fn expect_repository<'a>(
    platform: &'static str,
    value: &'a Value,
    url: &str,
    error_keys: &[&str],
) -> Result<&'a Value, FetchError> {
    let Some(object) = value.as_object() else {
        return Err(FetchError::Decode {
            url: url.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    if !object.contains_key("name") {
        if let Some(message) = error_keys
            .iter()
            .find_map(|key| object.get(*key))
            .map(|message| match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
        {
            return Err(FetchError::Api { platform, message });
        }
    }

    Ok(value)
}
