//! `catalog-enrich enrich`

use super::CliConfig;
use crate::config::EnrichConfig;
use crate::fetch::{ApiClient, HttpClient};
use crate::pipeline::{Pipeline, TransformOutcome, format_duration};
use crate::utils::{ProgressBar, atomic_write};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Enrich a catalog file.
///
/// The file is only transformed when its id (the path as given, or `--id`)
/// matches the configured target. A catalog that is not valid JSON produces a
/// warning and is left untouched; the command still succeeds so builds are
/// not broken by a typo.
#[derive(Args, Debug)]
pub struct EnrichCommand {
    /// Catalog file to enrich
    file: PathBuf,

    /// Id used for target matching (default: FILE as given)
    #[arg(long)]
    id: Option<String>,

    /// Write the enriched catalog here instead of overwriting FILE
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Items enriched concurrently per batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,
}

impl EnrichCommand {
    pub(crate) async fn execute(self, settings: EnrichConfig, cli: &CliConfig) -> Result<()> {
        let client = HttpClient::new(settings.request_timeout())
            .context("Failed to set up HTTP client")?
            .with_max_retries(settings.max_retries);

        self.run(settings, Arc::new(client), cli.no_progress).await
    }

    async fn run(
        self,
        mut settings: EnrichConfig,
        client: Arc<dyn ApiClient>,
        no_progress: bool,
    ) -> Result<()> {
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }

        let source = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read catalog {}", self.file.display()))?;
        let id = self.id.clone().unwrap_or_else(|| self.file.display().to_string());

        let pipeline = Pipeline::from_config(&settings, client)?;
        let progress = ProgressBar::for_items(0, no_progress);
        progress.set_prefix("Enriching");

        let outcome = pipeline.transform(&source, &id, &progress).await;
        progress.finish_and_clear();

        match outcome? {
            TransformOutcome::Skipped => {
                println!(
                    "{} {} does not match target {}; use --id to override",
                    "Skipped".yellow(),
                    id,
                    pipeline.filter().target()
                );
            }
            TransformOutcome::Malformed(warning) => {
                eprintln!("{} {}", "warning:".yellow().bold(), warning);
            }
            TransformOutcome::Transformed(output) => {
                let destination = self.out.as_ref().unwrap_or(&self.file);
                atomic_write(destination, output.code.as_bytes())
                    .with_context(|| format!("Failed to write catalog {}", destination.display()))?;

                println!(
                    "{} Enriched {} items in {} → {}",
                    "✓".green(),
                    output.items,
                    format_duration(output.elapsed),
                    destination.display()
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeApi, fixtures, test_endpoints};
    use serde_json::Value;
    use tempfile::TempDir;

    fn settings(temp: &TempDir) -> EnrichConfig {
        let endpoints = test_endpoints();
        EnrichConfig {
            target: "components.json".to_string(),
            cache_dir: temp.path().join("cache"),
            npm_registry: endpoints.npm_registry,
            github_api: endpoints.github_api,
            gitlab_api: endpoints.gitlab_api,
            ..EnrichConfig::default()
        }
    }

    fn command(file: PathBuf, out: Option<PathBuf>) -> EnrichCommand {
        EnrichCommand {
            file,
            id: None,
            out,
            batch_size: None,
        }
    }

    #[tokio::test]
    async fn test_writes_enriched_catalog_to_out() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("components.json");
        let out = temp.path().join("build/components.json");
        std::fs::write(&file, r#"[{"title":"A","npm":"a"}]"#).unwrap();
        let api = FakeApi::new().with_json(fixtures::npm_url("a"), fixtures::npm_package("a"));

        command(file.clone(), Some(out.clone()))
            .run(settings(&temp), Arc::new(api), true)
            .await
            .unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written[0]["description"], "a description");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), r#"[{"title":"A","npm":"a"}]"#);
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_left_untouched() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("components.json");
        std::fs::write(&file, "[{").unwrap();

        command(file.clone(), None).run(settings(&temp), Arc::new(FakeApi::new()), true).await.unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "[{");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();

        let result = command(temp.path().join("components.json"), None)
            .run(settings(&temp), Arc::new(FakeApi::new()), true)
            .await;

        assert!(result.is_err());
    }
}
