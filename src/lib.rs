//! ScribeDB: a batch write execution engine for an embedded document store.
//!
//! This facade crate re-exports the workspace members:
//! - [`core`]: shared types, errors, and the collaborator traits
//! - [`storage`]: the in-memory document store
//! - [`durability`]: op log and write-concern waiter
//! - [`executor`]: the batch coordinator itself
//!
//! Typical embedding wires the pieces together once per process:
//!
//! ```
//! use std::sync::Arc;
//! use scribedb::executor::{BatchExecutor, ExecutorConfig, MemMetadataCache};
//! use scribedb::storage::MemStore;
//! use scribedb::durability::CommitWaiter;
//!
//! let executor = BatchExecutor::new(
//!     Arc::new(MemStore::new()),
//!     Arc::new(MemMetadataCache::new()),
//!     Arc::new(CommitWaiter::new()),
//!     ExecutorConfig::default(),
//! );
//! # let _ = executor;
//! ```

pub use scribe_core as core;
pub use scribe_durability as durability;
pub use scribe_executor as executor;
pub use scribe_storage as storage;

pub use scribe_core::{BatchRequest, BatchResult, Namespace, WriteItem};
pub use scribe_executor::{BatchExecutor, ExecutorConfig};
