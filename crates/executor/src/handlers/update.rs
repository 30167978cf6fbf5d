//! Update handler.
//!
//! Three outcomes, distinguished by the store's result: matched existing
//! documents (counted as updated/modified), an upsert (counted once, with
//! the generated id surfaced to the caller), or matched-but-unchanged
//! (an update with a modified count of zero). The upsert and matched
//! increments are mutually exclusive for one outcome.

use serde_json::json;

use scribe_core::{Document, Namespace, OpKind, StoreResult, WriteOutcome};

use super::{fail_or_retry, WriteContext};

/// Apply one update item. The namespace write lock is held by the caller.
pub(crate) fn apply_update(
    cx: &mut WriteContext<'_>,
    ns: &Namespace,
    filter: &Document,
    update: &Document,
    multi: bool,
    upsert: bool,
) -> StoreResult<WriteOutcome> {
    match cx.store.update(ns, filter, update, multi, upsert) {
        Ok(result) => {
            if result.did_insert() {
                cx.stats.upserted += 1;
            } else {
                cx.stats.updated += result.matched;
                cx.stats.modified += result.modified;
            }
            // Only an update that touched something is a logged mutation.
            if result.did_insert() || result.matched > 0 {
                cx.log_op(
                    OpKind::Update,
                    ns,
                    &json!({ "filter": filter, "update": update }),
                );
            }
            match result.upserted_id {
                Some(id) => Ok(WriteOutcome::upserted(id)),
                None => Ok(WriteOutcome::success()),
            }
        }
        Err(err) => fail_or_retry(err),
    }
}
