//! Shared data models for catalog entries and upstream metadata.
//!
//! Two shapes flow through the pipeline:
//!
//! - [`CatalogItem`] - one entry of the catalog JSON array. It is kept as an
//!   ordered JSON object so fields this crate does not know about survive the
//!   round trip untouched and in their original order.
//! - [`InfoRecord`] - the normalized metadata every fetcher returns, whether it
//!   came from npm, GitHub or GitLab.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized metadata returned by every fetcher.
///
/// A fetcher that cannot produce real data returns [`InfoRecord::empty`]
/// instead of failing, so callers never see fetch errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoRecord {
    /// Short human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Keywords or topics. Empty when the source has none.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Homepage URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Source repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Canonical package or repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Star count on the hosting platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
}

impl InfoRecord {
    /// The record every fetcher falls back to: all scalars absent, no tags.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when the record carries no information at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    /// Converts the record into catalog fields, in merge order.
    ///
    /// Absent scalars are omitted; `tags` is always present, possibly empty.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(description) = &self.description {
            fields.insert("description".into(), Value::String(description.clone()));
        }
        fields.insert(
            "tags".into(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );
        if let Some(url) = &self.url {
            fields.insert("url".into(), Value::String(url.clone()));
        }
        if let Some(repo) = &self.repo {
            fields.insert("repo".into(), Value::String(repo.clone()));
        }
        if let Some(title) = &self.title {
            fields.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(stars) = self.stars {
            fields.insert("stars".into(), Value::from(stars));
        }
        fields
    }
}

/// One entry of the catalog.
///
/// Identity is the entry's position in the catalog; nothing else is assumed
/// to be unique. Accessors treat empty strings the same as missing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItem(Map<String, Value>);

impl CatalogItem {
    /// Creates an item with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a field, returning the builder for chaining in tests and fixtures.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the item, returning the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|value| !value.is_empty())
    }

    /// Registry package name, if the item declares one.
    #[must_use]
    pub fn npm(&self) -> Option<&str> {
        self.str_field("npm")
    }

    /// Source repository URL.
    #[must_use]
    pub fn repo(&self) -> Option<&str> {
        self.str_field("repo")
    }

    /// Homepage URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    /// String tags in order. Non-string entries are skipped.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn stars(&self) -> Option<u64> {
        self.0.get("stars").and_then(Value::as_u64)
    }

    /// The URL hosting platforms are probed with: `repo`, falling back to `url`.
    #[must_use]
    pub fn hosting_url(&self) -> Option<&str> {
        self.repo().or_else(|| self.url())
    }
}

impl From<Map<String, Value>> for CatalogItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
