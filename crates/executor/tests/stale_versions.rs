//! Shard-version validation: stale short-circuits, sentinel handling, the
//! post-batch metadata refresh, and the unique-index shard-key check.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use scribe_durability::CommitWaiter;
use scribe_executor::{
    BatchExecutor, BatchRequest, ErrorCode, ExecutorConfig, MemMetadataCache, Namespace,
    PartitionVersion, ShardMetadata,
};
use scribe_storage::MemStore;

struct Harness {
    store: Arc<MemStore>,
    cache: Arc<MemMetadataCache>,
    executor: BatchExecutor,
}

fn harness() -> Harness {
    let store = Arc::new(MemStore::new());
    let cache = Arc::new(MemMetadataCache::new());
    let config = ExecutorConfig {
        sharding_enabled: true,
        ..ExecutorConfig::default()
    };
    let executor = BatchExecutor::new(
        store.clone(),
        cache.clone(),
        Arc::new(CommitWaiter::new()),
        config,
    );
    Harness {
        store,
        cache,
        executor,
    }
}

fn users() -> Namespace {
    Namespace::new("app", "users")
}

fn version(major: u32) -> PartitionVersion {
    PartitionVersion::new(major, 0, Uuid::from_u128(7))
}

#[test]
fn test_stale_version_fails_without_touching_the_store() {
    let h = harness();
    h.cache.set_cached(users(), ShardMetadata::new(version(3), None));

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_shard_version(version(2));
    let result = h.executor.execute(&request);

    assert!(result.ok);
    assert_eq!(result.n, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error.code, ErrorCode::StaleShardVersion);
    let info = result.errors[0].error.info.as_ref().unwrap();
    assert_eq!(info["vWanted"]["v"][0], 3);
    assert_eq!(h.store.count(&users()), 0);
}

#[test]
fn test_stale_batch_triggers_refresh_for_the_next_one() {
    let h = harness();
    // Nothing cached locally: the node believes the collection is
    // unsharded, while the authoritative source knows better.
    h.cache
        .set_authoritative(users(), ShardMetadata::new(version(1), None));

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_shard_version(version(1));
    let first = h.executor.execute(&request);
    assert_eq!(first.errors[0].error.code, ErrorCode::StaleShardVersion);
    assert_eq!(h.store.count(&users()), 0);

    // The stale failure refreshed the cache; the retry routes correctly.
    let second = h.executor.execute(&request);
    assert!(second.errors.is_empty());
    assert_eq!(second.n, 1);
    assert_eq!(h.store.count(&users()), 1);
}

#[test]
fn test_refresh_failure_does_not_change_the_response() {
    let h = harness();
    h.cache.set_cached(users(), ShardMetadata::new(version(3), None));
    h.cache.set_refresh_unavailable(true);

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_shard_version(version(2));
    let result = h.executor.execute(&request);

    assert!(result.ok);
    assert_eq!(result.errors[0].error.code, ErrorCode::StaleShardVersion);
}

#[test]
fn test_ignored_sentinel_bypasses_validation() {
    let h = harness();
    h.cache.set_cached(users(), ShardMetadata::new(version(3), None));

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_shard_version(PartitionVersion::IGNORED);
    let result = h.executor.execute(&request);

    assert!(result.errors.is_empty());
    assert_eq!(result.n, 1);
}

#[test]
fn test_undeclared_version_is_never_checked() {
    let h = harness();
    h.cache.set_cached(users(), ShardMetadata::new(version(3), None));

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})]);
    let result = h.executor.execute(&request);

    assert!(result.errors.is_empty());
    assert_eq!(result.n, 1);
}

#[test]
fn test_newer_declared_version_is_compatible() {
    let h = harness();
    h.cache.set_cached(users(), ShardMetadata::new(version(2), None));

    let request = BatchRequest::inserts(users(), vec![json!({"_id": 1})])
        .with_shard_version(version(5));
    let result = h.executor.execute(&request);

    assert!(result.errors.is_empty());
    assert_eq!(result.n, 1);
}

#[test]
fn test_unique_index_must_cover_the_shard_key() {
    let h = harness();
    h.cache.set_cached(
        users(),
        ShardMetadata::new(version(1), Some(json!({"region": 1}))),
    );
    let index_ns = Namespace::new("app", "system.indexes");

    let incompatible = BatchRequest::inserts(
        index_ns.clone(),
        vec![json!({"ns": "app.users", "key": {"name": 1}, "name": "name_1", "unique": true})],
    );
    let result = h.executor.execute(&incompatible);
    assert_eq!(result.errors[0].error.code, ErrorCode::CannotCreateIndex);
    assert_eq!(h.store.index_count(&users()), 0);

    let covering = BatchRequest::inserts(
        index_ns,
        vec![json!({
            "ns": "app.users",
            "key": {"region": 1, "name": 1},
            "name": "region_name",
            "unique": true
        })],
    );
    let result = h.executor.execute(&covering);
    assert!(result.errors.is_empty());
    assert_eq!(h.store.index_count(&users()), 1);
}
