//! Item executor: one write item, retried across transient faults.
//!
//! Each attempt acquires the namespace write lock, validates the declared
//! shard version under that lock, and dispatches to the matching handler.
//! A transient `ResourceNotReady` fault from the store releases the lock
//! and retries the same item in place, with no backoff and no attempt
//! limit: the fault is expected to resolve as the store makes the needed
//! resource resident. Any other failure ends the item immediately.

use std::time::Instant;

use tracing::warn;

use scribe_core::{BatchRequest, OpKind, OpTimestamp, WriteItem, WriteOutcome};

use crate::batch::BatchExecutor;
use crate::handlers::{delete, insert, update, WriteContext};
use crate::sharding::{check_shard_version, stale_error, VersionCheck};
use crate::stats::BatchStats;

/// Execute the item at `index`, looping over transient faults.
pub(crate) fn apply_item(
    exec: &BatchExecutor,
    request: &BatchRequest,
    index: usize,
    stats: &mut BatchStats,
    last_op: &mut Option<OpTimestamp>,
) -> WriteOutcome {
    let kind: OpKind = request.kind.into();
    let target = request.targeting_namespace(index);
    let started = Instant::now();
    let mut attempts: u64 = 0;

    let outcome = loop {
        attempts += 1;
        if attempts % 1024 == 0 {
            warn!(
                ns = %target,
                index,
                attempts,
                "write still blocked on a transient resource fault"
            );
        }
        // The guard is dropped before the retry re-acquires, so the lock
        // is never held across attempts.
        let attempt = {
            let _guard = exec.locks.acquire_write(&target);
            execute_attempt(exec, request, index, stats, last_op)
        };
        match attempt {
            Ok(outcome) => break outcome,
            Err(err) if err.is_transient() => continue,
            // Handlers convert everything else at their boundary; this is
            // a safety net, not an expected path.
            Err(err) => break WriteOutcome::Failure(err.to_write_error()),
        }
    };

    exec.telemetry.record_op(kind, &request.namespace, started.elapsed());
    outcome
}

fn execute_attempt(
    exec: &BatchExecutor,
    request: &BatchRequest,
    index: usize,
    stats: &mut BatchStats,
    last_op: &mut Option<OpTimestamp>,
) -> scribe_core::StoreResult<WriteOutcome> {
    // Shard-version check, under the write lock so it cannot race a
    // concurrent metadata refresh.
    let metadata = if exec.config.sharding_enabled {
        let target = request.targeting_namespace(index);
        match check_shard_version(exec.cache.as_ref(), &target, request.shard_version.as_ref()) {
            VersionCheck::Stale { received, wanted } => {
                return Ok(WriteOutcome::Failure(stale_error(&received, &wanted)));
            }
            VersionCheck::Compatible { metadata } => metadata,
        }
    } else {
        None
    };

    let mut cx = WriteContext {
        store: exec.store.as_ref(),
        oplog: exec.oplog.as_deref(),
        stats,
        last_op,
    };
    match &request.items[index] {
        WriteItem::Insert { document } => {
            insert::apply_insert(&mut cx, &request.namespace, document, metadata.as_ref())
        }
        WriteItem::Update {
            filter,
            update,
            multi,
            upsert,
        } => update::apply_update(&mut cx, &request.namespace, filter, update, *multi, *upsert),
        WriteItem::Delete { filter, limit } => {
            delete::apply_delete(&mut cx, &request.namespace, filter, *limit)
        }
    }
}
