//! Integration test suite for catalog-enrich
//!
//! End-to-end tests through the public API and the compiled binary. No test
//! touches the network: library tests use the in-memory `FakeApi` from
//! `catalog_enrich::test_utils`, and binary tests only use catalogs that need
//! no upstream lookups.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: transform outcomes, caching across runs, partial failures
//! - **cli**: the `enrich` and `cache` commands

mod cli;
mod pipeline;
