//! Collaborator traits consumed by the batch executor.
//!
//! The executor never depends on concrete implementations: storage, the
//! partition-metadata cache, the op log, the durability waiter, and the
//! telemetry sink are all reached through these seams. `scribe-storage`
//! and `scribe-durability` provide the in-process implementations.

use std::time::Duration;

use crate::error::{ErrorCode, StoreResult};
use crate::types::{Document, DocumentId, Namespace, OpKind, OpTimestamp};
use crate::version::{PartitionVersion, ShardMetadata};
use crate::write_concern::WriteConcern;

/// Result of a store-level update call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    /// Number of documents the filter matched.
    pub matched: u64,
    /// Number of matched documents actually changed.
    pub modified: u64,
    /// Identifier of the document inserted by an upsert, when one occurred.
    /// Mutually exclusive with nonzero `matched`.
    pub upserted_id: Option<DocumentId>,
}

impl UpdateResult {
    /// True when the update inserted a new document instead of matching.
    pub fn did_insert(&self) -> bool {
        self.upserted_id.is_some()
    }
}

/// The data store the handlers write against.
///
/// Every method may raise `StoreError::ResourceNotReady` to signal the
/// transient fault that the item executor retries in place.
pub trait Store: Send + Sync {
    /// Create the collection if it does not exist yet.
    fn create_if_absent(&self, ns: &Namespace) -> StoreResult<()>;

    /// Insert one document; returns its identifier (assigned if absent).
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<DocumentId>;

    /// Apply a filter-driven update, optionally multi and/or upsert.
    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> StoreResult<UpdateResult>;

    /// Delete documents matching the filter; `limit == 1` bounds the
    /// removal to a single document, `0` is unbounded. Returns the count
    /// actually removed.
    fn delete(&self, ns: &Namespace, filter: &Document, limit: u64) -> StoreResult<u64>;

    /// Create an index described by an index document (`key`, `name`,
    /// optional `unique`). Raises `IndexAlreadyExists` for duplicates.
    fn create_index(&self, ns: &Namespace, spec: &Document) -> StoreResult<()>;
}

/// Process-wide cache of partitioning metadata, refreshed out-of-band.
///
/// Readers may race benignly with refreshes; the validator re-checks under
/// the namespace write lock, so the cache never needs to be strongly
/// consistent.
pub trait MetadataCache: Send + Sync {
    /// Locally cached metadata for a namespace, if any.
    fn get(&self, ns: &Namespace) -> Option<ShardMetadata>;

    /// Best-effort refresh from the authoritative source. Failures are
    /// logged and swallowed by the caller.
    fn refresh(
        &self,
        ns: &Namespace,
        known_version: &PartitionVersion,
    ) -> Result<PartitionVersion, String>;
}

/// What the durability waiter reports back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaitOutcome {
    /// The wait hit its deadline before the concern was satisfied.
    pub timed_out: bool,
    /// Error description, when the wait failed.
    pub err: Option<String>,
    /// Specific failure code, when the waiter has one.
    pub code: Option<ErrorCode>,
}

impl WaitOutcome {
    /// A satisfied wait.
    pub fn ok() -> Self {
        WaitOutcome::default()
    }

    /// True when the concern was satisfied.
    pub fn is_ok(&self) -> bool {
        !self.timed_out && self.err.is_none() && self.code.is_none()
    }
}

/// Blocks until a durability level is reached relative to an operation
/// timestamp, or the concern's deadline elapses.
pub trait DurabilityWaiter: Send + Sync {
    /// Synchronous wait; never panics, reports failure through the outcome.
    fn wait(&self, concern: &WriteConcern, since: OpTimestamp) -> WaitOutcome;
}

/// Durable operation log. Handlers append one record per successful write,
/// after the store mutation and before reporting success.
pub trait OpLog: Send + Sync {
    /// Append a record, returning its timestamp.
    fn append(&self, kind: OpKind, ns: &Namespace, doc: &Document) -> OpTimestamp;

    /// Timestamp of the most recently appended record, if any.
    fn last_op(&self) -> Option<OpTimestamp>;
}

/// Fire-and-forget execution-time telemetry. Must not affect correctness.
pub trait TelemetrySink: Send + Sync {
    /// Record one item's kind, namespace, and execution time.
    fn record_op(&self, kind: OpKind, ns: &Namespace, duration: Duration);
}
