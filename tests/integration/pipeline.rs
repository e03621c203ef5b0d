use catalog_enrich::config::EnrichConfig;
use catalog_enrich::enrich::ProgressReporter;
use catalog_enrich::fetch::ApiClient;
use catalog_enrich::pipeline::{Pipeline, TransformOutcome};
use catalog_enrich::test_utils::{FakeApi, fixtures, init_test_logging, test_endpoints};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const CATALOG_ID: &str = "/site/src/routes/components/components.json";

#[derive(Default)]
struct Recorder(Mutex<Vec<usize>>);

impl ProgressReporter for Recorder {
    fn batch_completed(&self, processed: usize, _total: usize) {
        self.0.lock().unwrap().push(processed);
    }
}

fn config(temp: &TempDir) -> EnrichConfig {
    let endpoints = test_endpoints();
    EnrichConfig {
        cache_dir: temp.path().join("cache"),
        npm_registry: endpoints.npm_registry,
        github_api: endpoints.github_api,
        gitlab_api: endpoints.gitlab_api,
        ..EnrichConfig::default()
    }
}

fn pipeline(temp: &TempDir, api: Arc<FakeApi>) -> Pipeline {
    let client: Arc<dyn ApiClient> = api;
    Pipeline::from_config(&config(temp), client).unwrap()
}

async fn transform(pipeline: &Pipeline, source: &str) -> Value {
    match pipeline.transform(source, CATALOG_ID, &Recorder::default()).await.unwrap() {
        TransformOutcome::Transformed(output) => serde_json::from_str(&output.code).unwrap(),
        other => panic!("expected a transformed catalog, got {other:?}"),
    }
}

fn catalog_api() -> FakeApi {
    FakeApi::new()
        .with_json(
            fixtures::npm_url("@acme/button"),
            fixtures::npm_package_with_repo("@acme/button", "https://github.com/acme/button"),
        )
        .with_json(
            fixtures::github_url("acme", "button"),
            fixtures::github_repo("button", 321, &["buttons", "svelte5"]),
        )
        .with_json(fixtures::gitlab_url("group", "forms"), fixtures::gitlab_project("forms", 12))
}

#[tokio::test]
async fn test_end_to_end_enrichment() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let api = Arc::new(catalog_api());
    let source = json!([
        { "title": "Button", "npm": "@acme/button", "category": "Inputs" },
        { "title": "Forms", "repo": "https://gitlab.com/group/forms", "tags": ["forms"] },
        { "title": "Plain", "url": "https://plain.example" }
    ])
    .to_string();

    let catalog = transform(&pipeline(&temp, api.clone()), &source).await;

    let button = &catalog[0];
    assert_eq!(button["title"], "Button");
    assert_eq!(button["category"], "Inputs");
    assert_eq!(button["description"], "@acme/button description");
    assert_eq!(button["repo"], "https://github.com/acme/button");
    assert_eq!(button["stars"], 321);
    assert_eq!(button["tags"], json!(["component", "buttons"]));

    let forms = &catalog[1];
    assert_eq!(forms["stars"], 12);
    assert_eq!(forms["tags"], json!(["forms"]));
    assert_eq!(forms["url"], "https://gitlab.com/owner/forms");

    assert_eq!(catalog[2], json!({ "title": "Plain", "url": "https://plain.example", "tags": [] }));

    let mut calls = api.calls();
    calls.sort();
    let mut expected = vec![
        fixtures::npm_url("@acme/button"),
        fixtures::github_url("acme", "button"),
        fixtures::gitlab_url("group", "forms"),
    ];
    expected.sort();
    assert_eq!(calls, expected);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let temp = TempDir::new().unwrap();
    let source = json!([{ "npm": "@acme/button" }]).to_string();

    let first_api = Arc::new(catalog_api());
    let first = transform(&pipeline(&temp, first_api.clone()), &source).await;
    assert_eq!(first_api.call_count(), 2);

    // A fresh pipeline over the same cache directory, with an upstream that knows nothing.
    let second_api = Arc::new(FakeApi::new());
    let second = transform(&pipeline(&temp, second_api.clone()), &source).await;

    assert_eq!(second_api.call_count(), 0);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failures_are_retried_on_the_next_run() {
    let temp = TempDir::new().unwrap();
    let source = json!([{ "npm": "flaky" }]).to_string();

    let down = Arc::new(FakeApi::new().with_status(fixtures::npm_url("flaky"), 503));
    let degraded = transform(&pipeline(&temp, down), &source).await;
    assert_eq!(degraded[0], json!({ "npm": "flaky", "tags": [] }));

    let up = Arc::new(FakeApi::new().with_json(fixtures::npm_url("flaky"), fixtures::npm_package("flaky")));
    let recovered = transform(&pipeline(&temp, up.clone()), &source).await;

    assert_eq!(up.call_count(), 1);
    assert_eq!(recovered[0]["title"], "flaky");
}

#[tokio::test]
async fn test_partial_failure_keeps_order_across_batches() {
    let temp = TempDir::new().unwrap();
    let mut api = FakeApi::new();
    for i in 0..25 {
        let name = format!("pkg-{i}");
        api = if i % 7 == 3 {
            api.with_status(fixtures::npm_url(&name), 500)
        } else {
            api.with_json(fixtures::npm_url(&name), fixtures::npm_package(&name))
        };
    }
    let source = Value::Array((0..25).map(|i| json!({ "npm": format!("pkg-{i}") })).collect()).to_string();
    let recorder = Recorder::default();

    let outcome = pipeline(&temp, Arc::new(api))
        .transform(&source, CATALOG_ID, &recorder)
        .await
        .unwrap();

    let TransformOutcome::Transformed(output) = outcome else {
        panic!("expected a transformed catalog");
    };
    let catalog: Value = serde_json::from_str(&output.code).unwrap();
    let items = catalog.as_array().unwrap();
    assert_eq!(items.len(), 25);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item["npm"], format!("pkg-{i}"));
        assert_eq!(item.get("title").is_some(), i % 7 != 3, "item {i}");
    }
    assert_eq!(*recorder.0.lock().unwrap(), [10, 20, 25]);
}

#[tokio::test]
async fn test_malformed_and_foreign_ids() {
    let temp = TempDir::new().unwrap();
    let api = Arc::new(FakeApi::new());
    let pipeline = pipeline(&temp, api.clone());

    let skipped = pipeline
        .transform("[]", "/site/src/routes/about/+page.svelte", &Recorder::default())
        .await
        .unwrap();
    assert_eq!(skipped, TransformOutcome::Skipped);

    let malformed = pipeline
        .transform("[{\"title\": \"A\",}]", CATALOG_ID, &Recorder::default())
        .await
        .unwrap();
    let TransformOutcome::Malformed(warning) = malformed else {
        panic!("expected a malformed outcome");
    };
    assert_eq!(warning.id, CATALOG_ID);
    assert!(warning.position > 0);

    assert_eq!(api.call_count(), 0);
}
