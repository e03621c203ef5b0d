//! Canned upstream payloads and the URLs they are served at.

use serde_json::{Value, json};

pub const NPM_REGISTRY: &str = "https://registry.test";
pub const GITHUB_API: &str = "https://github-api.test";
pub const GITLAB_API: &str = "https://gitlab-api.test";

/// Registry document URL for `package` under [`NPM_REGISTRY`].
#[must_use]
pub fn npm_url(package: &str) -> String {
    crate::fetch::npm::package_url(NPM_REGISTRY, package)
}

#[must_use]
pub fn github_url(owner: &str, repo: &str) -> String {
    format!("{GITHUB_API}/repos/{owner}/{repo}")
}

#[must_use]
pub fn gitlab_url(owner: &str, repo: &str) -> String {
    format!("{GITLAB_API}/projects/{owner}%2F{repo}")
}

/// A minimal registry document with no repository.
#[must_use]
pub fn npm_package(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} description"),
        "keywords": ["svelte", "component"],
        "homepage": format!("https://{name}.example"),
    })
}

/// A registry document whose repository points at `repo_url`.
#[must_use]
pub fn npm_package_with_repo(name: &str, repo_url: &str) -> Value {
    let mut package = npm_package(name);
    package["repository"] = json!({ "type": "git", "url": format!("git+{repo_url}.git") });
    package
}

#[must_use]
pub fn github_repo(name: &str, stars: u64, topics: &[&str]) -> Value {
    json!({
        "name": name,
        "full_name": format!("owner/{name}"),
        "description": format!("{name} on GitHub"),
        "homepage": "",
        "stargazers_count": stars,
        "topics": topics,
    })
}

#[must_use]
pub fn gitlab_project(name: &str, stars: u64) -> Value {
    json!({
        "name": name,
        "description": format!("{name} on GitLab"),
        "web_url": format!("https://gitlab.com/owner/{name}"),
        "star_count": stars,
    })
}
