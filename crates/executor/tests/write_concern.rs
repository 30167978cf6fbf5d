//! Write-concern enforcement at batch completion: the single wait, timeout
//! reporting, parse failures, and the no-successes skip.

use std::sync::Arc;

use serde_json::json;

use scribe_durability::{CommitWaiter, MemOpLog};
use scribe_executor::{
    BatchExecutor, BatchRequest, ErrorCode, ExecutorConfig, MemMetadataCache, Namespace,
    OpTimestamp,
};
use scribe_storage::MemStore;

struct Harness {
    waiter: Arc<CommitWaiter>,
    executor: BatchExecutor,
}

fn harness() -> Harness {
    let waiter = Arc::new(CommitWaiter::new());
    let executor = BatchExecutor::new(
        Arc::new(MemStore::new()),
        Arc::new(MemMetadataCache::new()),
        waiter.clone(),
        ExecutorConfig::default(),
    )
    .with_oplog(Arc::new(MemOpLog::new()));
    Harness { waiter, executor }
}

fn users() -> Namespace {
    Namespace::new("app", "users")
}

#[test]
fn test_default_concern_is_satisfied_locally() {
    let h = harness();
    let result = h
        .executor
        .execute(&BatchRequest::inserts(users(), vec![json!({"_id": 1})]));
    assert!(result.write_concern_error.is_none());
    assert_eq!(result.n, 1);
}

#[test]
fn test_unsatisfied_concern_times_out_with_structured_info() {
    let h = harness();
    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_write_concern(json!({"w": 2, "wtimeout": 50}));
    let result = h.executor.execute(&request);

    // The write itself stands; only durability is reported as failed.
    assert!(result.ok);
    assert_eq!(result.n, 1);
    let wce = result.write_concern_error.unwrap();
    assert_eq!(wce.code, ErrorCode::WriteConcernFailed);
    assert_eq!(wce.info.unwrap()["timedOut"], true);
}

#[test]
fn test_concern_satisfied_by_replication_watermark() {
    let h = harness();
    h.waiter.advance_replicated(OpTimestamp(u64::MAX));
    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_write_concern(json!({"w": 2, "wtimeout": 1000}));
    let result = h.executor.execute(&request);
    assert!(result.write_concern_error.is_none());
}

#[test]
fn test_journal_concern_waits_on_journal_watermark() {
    let h = harness();
    h.waiter.advance_replicated(OpTimestamp(u64::MAX));
    let concern = json!({"w": 1, "j": true, "wtimeout": 50});

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_write_concern(concern.clone());
    let result = h.executor.execute(&request);
    assert!(result.write_concern_error.unwrap().info.unwrap()["timedOut"] == true);

    h.waiter.advance_journaled(OpTimestamp(u64::MAX));
    let request = BatchRequest::inserts(users(), vec![json!({"_id": 2})])
        .with_write_concern(concern);
    let result = h.executor.execute(&request);
    assert!(result.write_concern_error.is_none());
}

#[test]
fn test_unparsable_concern_is_reported_even_when_quiet() {
    let h = harness();
    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_write_concern(json!({"w": true}))
        .with_verbose(false);
    let result = h.executor.execute(&request);

    assert!(result.ok);
    assert_eq!(result.n, 1);
    let wce = result.write_concern_error.unwrap();
    assert_eq!(wce.code, ErrorCode::FailedToParse);
}

#[test]
fn test_concern_skipped_when_nothing_succeeded() {
    let h = harness();
    h.executor
        .execute(&BatchRequest::inserts(users(), vec![json!({"_id": 1})]));

    // Every item fails, so the unreachable concern is never waited on.
    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_write_concern(json!({"w": 2, "wtimeout": 60_000}));
    let result = h.executor.execute(&request);

    assert!(result.ok);
    assert_eq!(result.n, 0);
    assert_eq!(result.errors[0].error.code, ErrorCode::DuplicateKey);
    assert!(result.write_concern_error.is_none());
}
