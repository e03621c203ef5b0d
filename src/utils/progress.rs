//! Progress display for catalog enrichment.
//!
//! A single bar on stderr, redrawn in place after each batch:
//!
//! ```text
//! Enriching [━━━━━━━━━━━━━━━━━━━━╸━━━━━━━━━━━━━━━━━━━] 20/23 (86%)
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_ENRICH_NO_PROGRESS`: Set to any value to disable the bar
//!
//! The bar is also hidden with `--no-progress` and whenever stderr is not a
//! terminal (indicatif draws nothing in that case).

use crate::constants::NO_PROGRESS_ENV;
use crate::enrich::ProgressReporter;
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Checks if progress bars should be disabled.
///
/// ```bash
/// CATALOG_ENRICH_NO_PROGRESS=1 catalog-enrich enrich components.json
/// ```
#[must_use]
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar with the crate's styling.
///
/// Cloning shares the underlying bar.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a bar for `len` items, hidden if progress is disabled via the
    /// environment.
    #[must_use]
    pub fn new(len: u64) -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }

        let bar = IndicatifBar::new(len);
        bar.set_style(default_style());
        Self { inner: bar }
    }

    /// A bar that draws nothing but still tracks its position.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Creates a visible bar unless `disabled` or the environment says otherwise.
    #[must_use]
    pub fn for_items(len: u64, disabled: bool) -> Self {
        if disabled { Self::hidden() } else { Self::new(len) }
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    #[must_use]
    pub fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

impl ProgressReporter for ProgressBar {
    fn batch_completed(&self, processed: usize, total: usize) {
        self.inner.set_length(total as u64);
        self.inner.set_position(processed as u64);
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_tracks_cumulative_counts() {
        let bar = ProgressBar::hidden();

        bar.batch_completed(10, 23);
        bar.batch_completed(20, 23);

        assert_eq!(bar.position(), 20);
        assert_eq!(bar.length(), Some(23));
    }

    #[test]
    fn test_disabled_bar_is_hidden() {
        let bar = ProgressBar::for_items(5, true);

        assert!(bar.inner.is_hidden());
        bar.batch_completed(5, 5);
        assert_eq!(bar.position(), 5);
        bar.finish_and_clear();
    }
}
