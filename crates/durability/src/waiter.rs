//! Durability waiter: blocks until a write concern is satisfied.
//!
//! Satisfaction is judged against two watermarks:
//! - `replicated`: highest op timestamp acknowledged by enough members
//! - `journaled`: highest op timestamp made durable in the journal
//!
//! `w: 0` and `w: 1` are satisfied by the local write alone. Anything
//! stronger waits on the replication watermark; `j: true` additionally
//! waits on the journal watermark. The wait is a synchronous condvar wait
//! with the concern's own deadline; hitting the deadline reports
//! `timed_out` rather than raising an error.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use scribe_core::{DurabilityWaiter, OpTimestamp, WMode, WaitOutcome, WriteConcern};

#[derive(Debug, Default)]
struct Watermarks {
    replicated: u64,
    journaled: u64,
}

/// Condvar-based implementation of [`DurabilityWaiter`].
///
/// Watermarks are advanced by whatever drives replication and journaling;
/// in this in-process build that is the embedding application (or a test).
#[derive(Debug, Default)]
pub struct CommitWaiter {
    marks: Mutex<Watermarks>,
    progress: Condvar,
}

impl CommitWaiter {
    /// Create a waiter with both watermarks at zero.
    pub fn new() -> Self {
        CommitWaiter::default()
    }

    /// Advance the replication watermark and wake blocked waiters.
    pub fn advance_replicated(&self, ts: OpTimestamp) {
        let mut marks = self.marks.lock();
        if ts.0 > marks.replicated {
            marks.replicated = ts.0;
            self.progress.notify_all();
        }
    }

    /// Advance the journal watermark and wake blocked waiters.
    pub fn advance_journaled(&self, ts: OpTimestamp) {
        let mut marks = self.marks.lock();
        if ts.0 > marks.journaled {
            marks.journaled = ts.0;
            self.progress.notify_all();
        }
    }

    fn satisfied(marks: &Watermarks, concern: &WriteConcern, since: OpTimestamp) -> bool {
        let replication_ok = match concern.w {
            WMode::Count(0) | WMode::Count(1) => true,
            WMode::Count(_) | WMode::Majority => marks.replicated >= since.0,
        };
        let journal_ok = !concern.journal || marks.journaled >= since.0;
        replication_ok && journal_ok
    }
}

impl DurabilityWaiter for CommitWaiter {
    fn wait(&self, concern: &WriteConcern, since: OpTimestamp) -> WaitOutcome {
        // Nothing was written; there is nothing to wait for.
        if since.0 == 0 {
            return WaitOutcome::ok();
        }
        let deadline = Instant::now() + concern.timeout;
        let mut marks = self.marks.lock();
        loop {
            if Self::satisfied(&marks, concern, since) {
                return WaitOutcome::ok();
            }
            if Instant::now() >= deadline {
                debug!(since = since.0, "durability wait hit its deadline");
                return WaitOutcome {
                    timed_out: true,
                    err: Some(format!(
                        "timed out waiting for write concern to be satisfied for op {since}"
                    )),
                    code: None,
                };
            }
            self.progress.wait_until(&mut marks, deadline);
        }
    }
}
