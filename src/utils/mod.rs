//! Utilities shared by the cache and the CLI
//!
//! # Modules
//!
//! - [`fs`] - Directory creation and atomic file writes
//! - [`progress`] - The batch progress bar
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_enrich::utils::{ProgressBar, atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> std::io::Result<()> {
//! ensure_dir(Path::new(".cache/catalog-enrich"))?;
//! atomic_write(Path::new("build/components.json"), b"[]\n")?;
//!
//! let progress = ProgressBar::new(23);
//! progress.set_prefix("Enriching");
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::ProgressBar;
