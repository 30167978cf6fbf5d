//! Insert handler.
//!
//! Inserts against the `system.indexes` pseudo-collection are
//! index-creation requests: the real target namespace is named inside the
//! document. Everything else is a plain document insert with implicit
//! collection creation.

use serde_json::Value as JsonValue;

use scribe_core::{
    Document, ErrorCode, Namespace, OpKind, ShardMetadata, StoreError, StoreResult, WriteError,
    WriteOutcome,
};

use super::{fail_or_retry, WriteContext};

/// Apply one insert item. The namespace write lock is held by the caller.
pub(crate) fn apply_insert(
    cx: &mut WriteContext<'_>,
    ns: &Namespace,
    document: &Document,
    metadata: Option<&ShardMetadata>,
) -> StoreResult<WriteOutcome> {
    if ns.is_index_namespace() {
        return apply_index_insert(cx, ns, document, metadata);
    }

    if let Err(err) = cx.store.create_if_absent(ns) {
        return creation_failure(err, ns);
    }
    match cx.store.insert(ns, document.clone()) {
        Ok(_id) => {
            cx.log_op(OpKind::Insert, ns, document);
            cx.stats.inserted += 1;
            Ok(WriteOutcome::success())
        }
        Err(err) => fail_or_retry(err),
    }
}

fn apply_index_insert(
    cx: &mut WriteContext<'_>,
    ns: &Namespace,
    document: &Document,
    metadata: Option<&ShardMetadata>,
) -> StoreResult<WriteOutcome> {
    let target = match document.get("ns").and_then(JsonValue::as_str) {
        Some(target) => match Namespace::parse(target) {
            Ok(target) => target,
            Err(err) => {
                return Ok(WriteOutcome::Failure(WriteError::new(
                    ErrorCode::BadValue,
                    err.to_string(),
                )))
            }
        },
        None => {
            return Ok(WriteOutcome::Failure(WriteError::new(
                ErrorCode::BadValue,
                "tried to create an index without specifying namespace",
            )))
        }
    };

    // A unique index on a sharded collection must cover the shard key.
    let unique = document.get("unique").and_then(JsonValue::as_bool).unwrap_or(false);
    if unique {
        if let Some(key_pattern) = metadata.and_then(|md| md.key_pattern.as_ref()) {
            if !unique_index_compatible(key_pattern, document.get("key")) {
                return Ok(WriteOutcome::Failure(unique_index_error(
                    key_pattern,
                    document.get("key"),
                )));
            }
        }
    }

    if let Err(err) = cx.store.create_if_absent(&target) {
        return creation_failure(err, &target);
    }
    match cx.store.create_index(&target, document) {
        Ok(()) => {
            cx.log_op(OpKind::Insert, ns, document);
            cx.stats.inserted += 1;
            Ok(WriteOutcome::success())
        }
        // An identical index is not an error for the client.
        Err(StoreError::IndexAlreadyExists(_)) => Ok(WriteOutcome::success()),
        Err(err) => fail_or_retry(err),
    }
}

fn creation_failure(err: StoreError, ns: &Namespace) -> StoreResult<WriteOutcome> {
    if err.is_transient() {
        return Err(err);
    }
    Ok(WriteOutcome::Failure(WriteError::new(
        ErrorCode::InternalError,
        format!("could not create collection {ns}"),
    )))
}

fn unique_index_compatible(shard_key: &Document, index_key: Option<&JsonValue>) -> bool {
    let Some(shard_fields) = shard_key.as_object() else {
        return true;
    };
    // A malformed key pattern is reported by the store, not here.
    let Some(index_fields) = index_key.and_then(JsonValue::as_object) else {
        return true;
    };
    shard_fields.keys().all(|field| index_fields.contains_key(field))
}

fn unique_index_error(shard_key: &Document, index_key: Option<&JsonValue>) -> WriteError {
    let index_key = index_key.cloned().unwrap_or(JsonValue::Null);
    WriteError::new(
        ErrorCode::CannotCreateIndex,
        format!("cannot create unique index over {index_key} with shard key pattern {shard_key}"),
    )
}
