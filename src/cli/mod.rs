//! Command-line interface for catalog-enrich
//!
//! # Commands
//!
//! - `enrich <FILE>` - enrich a catalog file with npm, GitHub and GitLab metadata
//! - `cache info|prune|clean` - inspect or maintain the metadata cache
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - log at `debug` / only `error` (default: `RUST_LOG` or `info`)
//! - `--no-progress` - hide the progress bar
//! - `--config <FILE>` - read settings from `FILE` instead of `catalog-enrich.toml`
//!
//! Logs go to stderr; command results go to stdout.
//!
//! # Examples
//!
//! ```bash
//! catalog-enrich enrich src/routes/components/components.json
//! catalog-enrich --no-progress enrich catalog.json --id src/routes/components/components.json --out build/components.json
//! catalog-enrich cache prune
//! ```

mod cache;
mod enrich;

pub use cache::CacheCommand;
pub use enrich::EnrichCommand;

use crate::config::EnrichConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from global flags, separate from the parsed CLI so tests
/// can inject them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter to install. `None` means `RUST_LOG`, or `info` if unset.
    pub log_level: Option<String>,
    /// Hide the progress bar.
    pub no_progress: bool,
    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the stderr log subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Build-time enrichment of component catalogs.
#[derive(Parser, Debug)]
#[command(
    name = "catalog-enrich",
    about = "Enrich a component catalog with npm, GitHub and GitLab metadata",
    version,
    long_about = "Reads a JSON array of catalog items, fills in descriptions, tags, stars and \
                  links from the npm registry and GitHub/GitLab, and writes the result back. \
                  Upstream answers are cached on disk between runs."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Hide the progress bar
    #[arg(long, global = true)]
    no_progress: bool,

    /// Configuration file (default: ./catalog-enrich.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich a catalog file
    Enrich(EnrichCommand),

    /// Inspect or maintain the metadata cache
    Cache(CacheCommand),
}

impl Cli {
    /// Runs the parsed command with logging configured from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the command fails.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translates global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Loads settings and dispatches to the subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let settings = EnrichConfig::load(config.config_path.as_deref()).await?.with_env_tokens();

        match self.command {
            Commands::Enrich(cmd) => cmd.execute(settings, &config).await,
            Commands::Cache(cmd) => cmd.execute(&settings).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_and_quiet_levels() {
        let cli = Cli::parse_from(["catalog-enrich", "--verbose", "cache", "info"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["catalog-enrich", "cache", "info", "--quiet"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("error"));

        let cli = Cli::parse_from(["catalog-enrich", "cache", "info"]);
        assert_eq!(cli.build_config().log_level, None);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["catalog-enrich", "-v", "-q", "cache", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_reach_config() {
        let cli = Cli::parse_from([
            "catalog-enrich",
            "enrich",
            "components.json",
            "--no-progress",
            "--config",
            "ci.toml",
        ]);
        let config = cli.build_config();

        assert!(config.no_progress);
        assert_eq!(config.config_path, Some(PathBuf::from("ci.toml")));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
