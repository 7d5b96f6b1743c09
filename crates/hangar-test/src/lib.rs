//! # hangar-test
//!
//! Integration tests for Hangar.
//!
//! This crate contains:
//! - Engine property tests (identities, deletes, updates, fetch paths)
//! - Transaction and concurrency tests
//! - Unsupported-statement policy and uniqueness tests

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Test utilities and helpers
pub mod utils;

/// Workload generators
pub mod workload;
