//! Error handling for catalog-enrich
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`EnrichError`] - enumerated failure cases of the pipeline, configuration and cache
//! - [`ErrorContext`] - wrapper that adds details and a suggestion for terminal display
//!
//! Upstream fetch failures are absent here: they never escape a
//! fetcher (see [`crate::fetch::FetchError`]). The only catalog-level failure
//! that reaches the user is a malformed catalog, and even that is reported as a
//! warning by the pipeline rather than as an error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use catalog_enrich::core::{EnrichError, user_friendly_error};
//!
//! let error = EnrichError::ConfigError {
//!     message: "batch_size must be at least 1".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display(); // Shows colored error with a suggestion
//! ```

use crate::cache::CacheError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for catalog-enrich operations.
///
/// # Error Categories
///
/// ## Configuration
/// - [`ConfigError`] - invalid configuration values
/// - [`ConfigNotFound`] - an explicitly requested config file is missing
/// - [`InvalidFilter`] - include/exclude pattern is not a valid glob
/// - [`TomlError`] - TOML parsing errors from [`toml::de::Error`]
///
/// ## Storage
/// - [`Cache`] - cache directory could not be created or written
/// - [`JsonError`] - the enriched catalog could not be serialized
///
/// [`ConfigError`]: EnrichError::ConfigError
/// [`ConfigNotFound`]: EnrichError::ConfigNotFound
/// [`InvalidFilter`]: EnrichError::InvalidFilter
/// [`TomlError`]: EnrichError::TomlError
/// [`Cache`]: EnrichError::Cache
/// [`JsonError`]: EnrichError::JsonError
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Configuration values are invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What is wrong with the configuration
        message: String,
    },

    /// A configuration file passed explicitly does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was requested
        path: String,
    },

    /// An include or exclude filter is not a valid glob pattern.
    #[error("Invalid file filter '{pattern}': {reason}")]
    InvalidFilter {
        /// The offending pattern
        pattern: String,
        /// Why the pattern was rejected
        reason: String,
    },

    /// The persistent cache could not be opened or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything else, carrying a preformatted message.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Error wrapper that adds a suggestion and details for terminal display.
///
/// ```rust,no_run
/// use catalog_enrich::core::{EnrichError, ErrorContext};
///
/// let context = ErrorContext::new(EnrichError::ConfigNotFound {
///     path: "enrich.toml".to_string(),
/// })
/// .with_suggestion("Check the path passed to --config")
/// .with_details("Only the default catalog-enrich.toml may be absent");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: EnrichError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: EnrichError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error. Displayed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error. Displayed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Configuration errors get a tailored suggestion. Everything else
/// is shown with its full cause chain, with a hint for cache and I/O failures.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(context) = error.downcast_ref::<EnrichError>().and_then(create_error_context) {
        return context;
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    let context = ErrorContext::new(EnrichError::Other {
        message,
    });

    let is_cache_error = error.downcast_ref::<CacheError>().is_some()
        || matches!(error.downcast_ref::<EnrichError>(), Some(EnrichError::Cache(_)));
    if is_cache_error {
        return context
            .with_suggestion(
                "Check that the cache directory is writable, or run `catalog-enrich cache clean`",
            )
            .with_details("The cache directory is created on first use");
    }

    match error.downcast_ref::<std::io::Error>().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => context
            .with_suggestion("Check file ownership and permissions")
            .with_details("catalog-enrich needs to read the catalog and write the cache directory"),
        Some(std::io::ErrorKind::NotFound) => {
            context.with_suggestion("Check that the catalog path is correct")
        }
        _ => context,
    }
}

fn create_error_context(error: &EnrichError) -> Option<ErrorContext> {
    let context = match error {
        EnrichError::ConfigError {
            message,
        } => ErrorContext::new(EnrichError::ConfigError {
            message: message.clone(),
        })
        .with_suggestion("Fix the value in catalog-enrich.toml or the matching command-line flag"),
        EnrichError::ConfigNotFound {
            path,
        } => ErrorContext::new(EnrichError::ConfigNotFound {
            path: path.clone(),
        })
        .with_suggestion("Check the path passed to --config")
        .with_details("Only the default catalog-enrich.toml is optional"),
        EnrichError::InvalidFilter {
            pattern,
            reason,
        } => ErrorContext::new(EnrichError::InvalidFilter {
            pattern: pattern.clone(),
            reason: reason.clone(),
        })
        .with_suggestion("Use glob syntax such as 'src/**/*.json'"),
        _ => return None,
    };
    Some(context)
}
