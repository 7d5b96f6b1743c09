//! In-memory storage.
//!
//! Storage is a registry of named relations, each an ordered list of rows
//! with its own identity counter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Executor                    │
//! └─────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │                 Registry                    │
//! │  ┌───────────┐  ┌───────────┐  ┌─────────┐  │
//! │  │  users    │  │  drones   │  │  ...    │  │
//! │  │ rows, id  │  │ rows, id  │  │         │  │
//! │  └───────────┘  └───────────┘  └─────────┘  │
//! └─────────────────────────────────────────────┘
//! ```

mod error;
mod registry;
mod relation;

pub use error::{StorageError, StorageResult};
pub use registry::Registry;
pub use relation::Relation;
