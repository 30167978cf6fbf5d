//! Delete handler.

use serde_json::json;

use scribe_core::{Document, Namespace, OpKind, StoreResult, WriteOutcome};

use super::{fail_or_retry, WriteContext};

/// Apply one delete item. The namespace write lock is held by the caller.
///
/// `limit == 1` removes a single document, `0` removes every match.
pub(crate) fn apply_delete(
    cx: &mut WriteContext<'_>,
    ns: &Namespace,
    filter: &Document,
    limit: u64,
) -> StoreResult<WriteOutcome> {
    match cx.store.delete(ns, filter, limit) {
        Ok(removed) => {
            cx.stats.deleted += removed;
            if removed > 0 {
                cx.log_op(OpKind::Delete, ns, &json!({ "filter": filter, "limit": limit }));
            }
            Ok(WriteOutcome::success())
        }
        Err(err) => fail_or_retry(err),
    }
}
