//! GitHub repository metadata.

use super::hosting::{HostingPlatform, RepoRef, capture_repo, expect_repository};
use super::{ApiRequest, Auth, FetchError, Upstream, string_field, string_list};
use crate::models::InfoRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// `https://github.com/o/r`, `git+https://…`, `git://…`, `ssh://git@…` and
/// `git@github.com:o/r`, with an optional `www.`.
static GITHUB_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(?:git\+)?(?:(?:https?|git|ssh)://(?:[^@/]+@)?(?:www\.)?(?i:github\.com)/|git@(?i:github\.com):)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)",
    )
    .ok()
});

pub struct GitHub;

impl HostingPlatform for GitHub {
    const NAME: &'static str = "github";

    fn repo_ref(url: &str) -> Option<RepoRef> {
        capture_repo(GITHUB_URL.as_ref(), url)
    }

    fn request(upstream: &Upstream, repo: &RepoRef) -> ApiRequest {
        let base = upstream.endpoints().github_api.trim_end_matches('/');
        ApiRequest::new(format!("{base}/repos/{}/{}", repo.owner, repo.name))
            .with_auth(upstream.credentials().github.clone().map(Auth::Bearer))
    }

    fn parse(value: &Value, url: &str) -> Result<InfoRecord, FetchError> {
        let repo = expect_repository(Self::NAME, value, url, &["message"])?;

        Ok(InfoRecord {
            description: string_field(repo, "description"),
            tags: string_list(repo, "topics"),
            url: string_field(repo, "homepage"),
            repo: None,
            title: string_field(repo, "name"),
            stars: repo.get("stargazers_count").and_then(Value::as_u64),
        })
    }
}
