//! Core types for catalog-enrich
//!
//! Currently this is the error system: [`EnrichError`] for precise handling in
//! code and [`ErrorContext`] / [`user_friendly_error`] for presenting failures
//! to CLI users with details and suggestions.

pub mod error;

pub use error::{EnrichError, ErrorContext, user_friendly_error};
