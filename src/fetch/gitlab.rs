//! GitLab project metadata.

use super::hosting::{HostingPlatform, RepoRef, capture_repo, expect_repository};
use super::{ApiRequest, Auth, FetchError, Upstream, string_field};
use crate::models::InfoRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static GITLAB_URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^https://(?i:gitlab\.com)/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)").ok()
});

pub struct GitLab;

impl HostingPlatform for GitLab {
    const NAME: &'static str = "gitlab";

    fn repo_ref(url: &str) -> Option<RepoRef> {
        capture_repo(GITLAB_URL.as_ref(), url)
    }

    fn request(upstream: &Upstream, repo: &RepoRef) -> ApiRequest {
        let base = upstream.endpoints().gitlab_api.trim_end_matches('/');
        ApiRequest::new(format!("{base}/projects/{}%2F{}", repo.owner, repo.name))
            .with_auth(upstream.credentials().gitlab.clone().map(Auth::PrivateToken))
    }

    /// GitLab has no topic list worth merging, so `tags` stays empty.
    fn parse(value: &Value, url: &str) -> Result<InfoRecord, FetchError> {
        let project = expect_repository(Self::NAME, value, url, &["message", "error"])?;

        Ok(InfoRecord {
            description: string_field(project, "description"),
            tags: Vec::new(),
            url: string_field(project, "web_url"),
            repo: None,
            title: string_field(project, "name"),
            stars: project.get("star_count").and_then(Value::as_u64),
        })
    }
}
