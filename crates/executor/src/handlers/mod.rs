//! Operation handlers: the type-specific write logic.
//!
//! One handler per write kind. Each runs with the namespace write lock
//! already held, converts every store failure to a structured per-item
//! error at this boundary — except the transient `ResourceNotReady` fault,
//! which propagates as `Err` so the item executor can retry in place — and
//! appends to the op log after the store mutation, before reporting
//! success.

pub(crate) mod delete;
pub(crate) mod insert;
pub(crate) mod update;

use scribe_core::{Document, Namespace, OpKind, OpLog, OpTimestamp, Store, StoreError, WriteOutcome};

use crate::stats::BatchStats;

/// Shared mutable state one handler invocation operates on.
pub(crate) struct WriteContext<'a> {
    /// The data store.
    pub store: &'a dyn Store,
    /// Durable operation log, when the deployment tracks one.
    pub oplog: Option<&'a dyn OpLog>,
    /// Per-batch counters; incremented only on success.
    pub stats: &'a mut BatchStats,
    /// Timestamp of the latest operation this batch produced.
    pub last_op: &'a mut Option<OpTimestamp>,
}

impl WriteContext<'_> {
    /// Emit the durable write-ahead record for a completed mutation and
    /// remember its timestamp for the write-concern wait.
    pub(crate) fn log_op(&mut self, kind: OpKind, ns: &Namespace, doc: &Document) {
        if let Some(oplog) = self.oplog {
            *self.last_op = Some(oplog.append(kind, ns, doc));
        }
    }
}

/// Route a store failure: transient faults bubble up for the retry loop,
/// everything else becomes a per-item failure outcome.
pub(crate) fn fail_or_retry(err: StoreError) -> Result<WriteOutcome, StoreError> {
    if err.is_transient() {
        Err(err)
    } else {
        Ok(WriteOutcome::Failure(err.to_write_error()))
    }
}
