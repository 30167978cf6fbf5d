//! In-memory operation log.
//!
//! Every successful write appends one record here, after the store
//! mutation and before the handler reports success. The log hands out
//! monotonic logical timestamps; the durability waiter compares those
//! against replication and journal watermarks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use scribe_core::{Document, Namespace, OpKind, OpLog, OpTimestamp};

/// Default number of records retained in the in-memory tail.
pub const DEFAULT_TAIL_CAPACITY: usize = 4096;

/// One logged operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpRecord {
    /// Logical timestamp, unique and monotonically increasing.
    pub ts: OpTimestamp,
    /// Kind of the operation.
    pub kind: OpKind,
    /// Namespace the operation targeted.
    pub ns: Namespace,
    /// The operation payload (document, update expression, or filter).
    pub doc: Document,
    /// Wall-clock time the record was appended.
    pub wall: DateTime<Utc>,
}

/// In-memory op log with a bounded tail.
///
/// Timestamp allocation is a single atomic increment; the tail is only
/// touched under a short mutex. Readers of `last_op` never block.
#[derive(Debug)]
pub struct MemOpLog {
    next: AtomicU64,
    // 0 means "nothing appended yet"; real timestamps start at 1.
    last: AtomicU64,
    tail: Mutex<VecDeque<OpRecord>>,
    capacity: usize,
}

impl MemOpLog {
    /// Create a log with the default tail capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TAIL_CAPACITY)
    }

    /// Create a log retaining at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        MemOpLog {
            next: AtomicU64::new(1),
            last: AtomicU64::new(0),
            tail: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Snapshot of the retained tail, oldest first.
    pub fn tail(&self) -> Vec<OpRecord> {
        self.tail.lock().iter().cloned().collect()
    }
}

impl Default for MemOpLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OpLog for MemOpLog {
    fn append(&self, kind: OpKind, ns: &Namespace, doc: &Document) -> OpTimestamp {
        let ts = OpTimestamp(self.next.fetch_add(1, Ordering::SeqCst));
        let record = OpRecord {
            ts,
            kind,
            ns: ns.clone(),
            doc: doc.clone(),
            wall: Utc::now(),
        };
        {
            let mut tail = self.tail.lock();
            if tail.len() == self.capacity {
                tail.pop_front();
            }
            tail.push_back(record);
        }
        self.last.fetch_max(ts.0, Ordering::SeqCst);
        trace!(ts = ts.0, kind = %kind, ns = %ns, "appended op record");
        ts
    }

    fn last_op(&self) -> Option<OpTimestamp> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            ts => Some(OpTimestamp(ts)),
        }
    }
}
