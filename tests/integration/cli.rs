use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A project directory whose config targets `components.json` and keeps the
/// cache inside the directory.
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("catalog-enrich.toml"),
        "target = \"components.json\"\ncache_dir = \"cache\"\n",
    )
    .unwrap();
    temp
}

fn catalog_enrich(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("catalog-enrich").unwrap();
    cmd.current_dir(dir)
        .env("CATALOG_ENRICH_NO_PROGRESS", "1")
        .env("NO_COLOR", "1")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITLAB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_malformed_catalog_warns_and_succeeds() {
    let temp = project();
    fs::write(temp.path().join("components.json"), "[{\"title\": ").unwrap();

    catalog_enrich(temp.path())
        .args(["enrich", "components.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"))
        .stderr(predicate::str::contains("components.json"))
        .stderr(predicate::str::contains("position"));

    assert_eq!(fs::read_to_string(temp.path().join("components.json")).unwrap(), "[{\"title\": ");
}

#[test]
fn test_catalog_without_sources_is_rewritten() {
    let temp = project();
    fs::write(temp.path().join("components.json"), r#"[{"title":"A"}]"#).unwrap();

    catalog_enrich(temp.path())
        .args(["--quiet", "enrich", "components.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enriched 1 items"));

    let written = fs::read_to_string(temp.path().join("components.json")).unwrap();
    assert_eq!(written, "[\n  {\n    \"title\": \"A\",\n    \"tags\": []\n  }\n]\n");
}

#[test]
fn test_out_flag_leaves_input_alone() {
    let temp = project();
    fs::write(temp.path().join("components.json"), "[]").unwrap();

    catalog_enrich(temp.path())
        .args(["enrich", "components.json", "--out", "build/out.json"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(temp.path().join("components.json")).unwrap(), "[]");
    assert_eq!(fs::read_to_string(temp.path().join("build/out.json")).unwrap(), "[]\n");
}

#[test]
fn test_non_target_file_is_skipped() {
    let temp = project();
    fs::write(temp.path().join("other.json"), "[]").unwrap();

    catalog_enrich(temp.path())
        .args(["enrich", "other.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));

    catalog_enrich(temp.path())
        .args(["enrich", "other.json", "--id", "components.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enriched 0 items"));
}

#[test]
fn test_missing_catalog_fails() {
    let temp = project();

    catalog_enrich(temp.path())
        .args(["enrich", "components.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read catalog"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();

    catalog_enrich(temp.path())
        .args(["--config", "nope.toml", "cache", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_invalid_batch_size_fails() {
    let temp = project();
    fs::write(temp.path().join("components.json"), "[]").unwrap();

    catalog_enrich(temp.path())
        .args(["enrich", "components.json", "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_cache_info_and_clean() {
    let temp = project();
    let cache = temp.path().join("cache");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("npm-a.json"), "not an entry").unwrap();

    catalog_enrich(temp.path())
        .args(["cache", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("corrupt: 1"));

    catalog_enrich(temp.path())
        .args(["cache", "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cache entries"));

    assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
}
