//! Field merge policy for folding upstream metadata into catalog items.
//!
//! The catalog author's values always win. Upstream data only fills gaps,
//! except for `tags`, which are accumulated from every source and then
//! filtered:
//!
//! ```text
//! base.tags        = ["ui", "svelte-kit"]
//! additional.tags  = ["framework", "svelte"]
//! merged.tags      = ["ui", "framework"]
//! ```
//!
//! Tags containing `svelte` are dropped because every entry in the catalog is
//! a Svelte component and the tag carries no information there.

use crate::models::{CatalogItem, InfoRecord};
use serde_json::{Map, Value};

/// Substring that disqualifies a tag.
const REDUNDANT_TAG: &str = "svelte";

/// Merges an upstream record into a catalog item.
#[must_use]
pub fn merge(base: &CatalogItem, additional: &InfoRecord) -> CatalogItem {
    CatalogItem::from(merge_fields(base.as_map(), &additional.to_fields()))
}

/// Merges two JSON objects with the catalog precedence rules.
///
/// For every field of `additional`, in order:
///
/// - falsy values (`null`, `""`, `0`, `false`) are skipped
/// - a key missing from the result, or present as `null`, is assigned
/// - `tags` arrays are concatenated (base first) and filtered
/// - any other key keeps the base value
///
/// Empty arrays are not falsy; an empty `tags` still passes through the
/// filter, which drops `svelte` tags already present in `base`.
#[must_use]
pub fn merge_fields(base: &Map<String, Value>, additional: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, value) in additional {
        if is_falsy(value) {
            continue;
        }

        if matches!(merged.get(key), None | Some(Value::Null)) {
            merged.insert(key.clone(), value.clone());
            continue;
        }

        if key == "tags" {
            if let (Some(Value::Array(existing)), Value::Array(extra)) = (merged.get_mut(key), value) {
                existing.extend(extra.iter().cloned());
                existing.retain(|tag| !is_redundant_tag(tag));
            }
        }
    }

    merged
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Non-string entries are never matched and survive the filter.
fn is_redundant_tag(tag: &Value) -> bool {
    tag.as_str().is_some_and(|text| text.contains(REDUNDANT_TAG))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> CatalogItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_base_wins_for_scalars() {
        let base = item(json!({ "title": "A" }));
        let info = InfoRecord {
            title: Some("B".into()),
            ..InfoRecord::empty()
        };

        let merged = merge(&base, &info);

        assert_eq!(merged.title(), Some("A"));
    }

    #[test]
    fn test_missing_and_null_fields_are_filled() {
        let base = item(json!({ "title": "A", "description": null }));
        let info = InfoRecord {
            description: Some("filled".into()),
            stars: Some(5),
            ..InfoRecord::empty()
        };

        let merged = merge(&base, &info);

        assert_eq!(merged.description(), Some("filled"));
        assert_eq!(merged.stars(), Some(5));
    }

    #[test]
    fn test_tags_concatenate_and_drop_svelte() {
        let base = item(json!({ "tags": ["ui", "svelte-kit"] }));
        let info = InfoRecord {
            tags: vec!["framework".into(), "svelte".into()],
            ..InfoRecord::empty()
        };

        let merged = merge(&base, &info);

        assert_eq!(merged.get("tags"), Some(&json!(["ui", "framework"])));
    }

    #[test]
    fn test_tag_filter_is_case_sensitive() {
        let base = item(json!({ "tags": ["Svelte"] }));
        let info = InfoRecord {
            tags: vec!["sveltekit".into()],
            ..InfoRecord::empty()
        };

        assert_eq!(merge(&base, &info).get("tags"), Some(&json!(["Svelte"])));
    }

    #[test]
    fn test_empty_tags_still_filter_base() {
        let base = item(json!({ "tags": ["svelte", "ui"] }));

        let merged = merge(&base, &InfoRecord::empty());

        assert_eq!(merged.get("tags"), Some(&json!(["ui"])));
    }

    #[test]
    fn test_empty_tags_are_assigned_when_missing() {
        let merged = merge(&item(json!({ "title": "A" })), &InfoRecord::empty());

        assert_eq!(merged.get("tags"), Some(&json!([])));
    }

    #[test]
    fn test_falsy_values_are_skipped() {
        let base = Map::new();
        let additional = json!({ "a": null, "b": "", "c": 0, "d": false, "e": 0.0, "f": 1 });
        let additional = additional.as_object().unwrap();

        let merged = merge_fields(&base, additional);

        assert_eq!(Value::Object(merged), json!({ "f": 1 }));
    }

    #[test]
    fn test_unknown_base_fields_survive_in_order() {
        let base = item(json!({ "z": 1, "npm": "pkg", "a": [1, 2] }));
        let info = InfoRecord {
            url: Some("https://x.test".into()),
            ..InfoRecord::empty()
        };

        let merged = merge(&base, &info);
        let keys: Vec<_> = merged.as_map().keys().map(String::as_str).collect();

        assert_eq!(keys, ["z", "npm", "a", "tags", "url"]);
    }

    #[test]
    fn test_non_array_base_tags_are_kept() {
        let base = item(json!({ "tags": "ui" }));
        let info = InfoRecord {
            tags: vec!["extra".into()],
            ..InfoRecord::empty()
        };

        assert_eq!(merge(&base, &info).get("tags"), Some(&json!("ui")));
    }
}
