//! Hangar Performance Benchmarks
//!
//! This crate contains benchmarks for the Hangar components:
//! - Statement classification and parsing
//! - Execution through prepared statements
//! - Transactions and shared handles
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p hangar-bench
//! ```

pub mod utils;
