//! `catalog-enrich cache`

use crate::cache::CacheStore;
use crate::config::EnrichConfig;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

/// Inspect or maintain the metadata cache.
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
enum CacheSubcommand {
    /// Show entry counts by age and total size
    Info,
    /// Delete entries past the retention window and unreadable files
    Prune,
    /// Delete every entry
    Clean,
}

impl CacheCommand {
    pub(crate) async fn execute(self, settings: &EnrichConfig) -> Result<()> {
        let store = CacheStore::open(&settings.cache_dir, settings.expiry_policy())?;

        match self.command {
            CacheSubcommand::Info => {
                let stats = store.stats().await?;
                println!("{} {}", "Cache:".bold(), store.dir().display());
                println!("  fresh:   {}", stats.fresh);
                println!("  stale:   {}", stats.stale);
                println!("  expired: {}", stats.expired);
                if stats.corrupt > 0 {
                    println!("  corrupt: {}", stats.corrupt.to_string().yellow());
                }
                println!("  size:    {}", format_size(stats.bytes));
            }
            CacheSubcommand::Prune => {
                let stats = store.prune().await?;
                println!(
                    "{} Removed {} expired and {} unreadable entries, kept {}",
                    "✓".green(),
                    stats.expired,
                    stats.corrupt,
                    stats.kept
                );
            }
            CacheSubcommand::Clean => {
                let removed = store.clear().await?;
                println!("{} Removed {} cache entries", "✓".green(), removed);
            }
        }

        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;

    if value < KIB {
        format!("{bytes} B")
    } else if value < KIB * KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{:.1} MiB", value / (KIB * KIB))
    }
}
