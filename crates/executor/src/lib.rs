//! Batch write execution engine.
//!
//! The executor takes a [`BatchRequest`] and runs its items strictly in
//! order against a [`Store`], with per-namespace exclusive write locks,
//! shard-version validation, transparent retry of transient store faults,
//! and a single write-concern wait once the item loop finishes. The
//! response is a [`BatchResult`]: `ok` on every completion, failure only
//! through per-item errors and the write-concern error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod config;
mod handlers;
mod item;
pub mod locks;
pub mod sharding;
pub mod stats;
pub mod telemetry;
mod write_concern;

pub use batch::BatchExecutor;
pub use config::ExecutorConfig;
pub use locks::NamespaceLocks;
pub use sharding::{check_shard_version, MemMetadataCache, VersionCheck};
pub use stats::BatchStats;
pub use telemetry::{TracingTelemetry, DEFAULT_SLOW_OP_THRESHOLD};

pub use scribe_core::*;
