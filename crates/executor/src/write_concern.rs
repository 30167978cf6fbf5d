//! Write-concern enforcement after the batch loop.

use scribe_core::{
    DurabilityWaiter, ErrorCode, OpTimestamp, WriteConcern, WriteConcernError,
};
use serde_json::Value as JsonValue;

/// Resolve and enforce the effective write concern.
///
/// The request's explicit spec wins over the process default. A spec that
/// fails to parse is reported immediately, without waiting. Otherwise the
/// calling thread blocks until the concern is satisfied relative to
/// `last_op` or the concern's deadline elapses.
///
/// Returns `None` when the concern was satisfied.
pub(crate) fn enforce_write_concern(
    waiter: &dyn DurabilityWaiter,
    requested: Option<&JsonValue>,
    default_concern: &WriteConcern,
    last_op: Option<OpTimestamp>,
) -> Option<WriteConcernError> {
    let concern = match requested {
        Some(spec) => match WriteConcern::parse(spec) {
            Ok(concern) => concern,
            Err(err) => {
                return Some(WriteConcernError {
                    code: err.code,
                    message: err.message,
                    info: err.info,
                })
            }
        },
        None => default_concern.clone(),
    };

    let since = last_op.unwrap_or_default();
    let outcome = waiter.wait(&concern, since);
    if outcome.is_ok() {
        return None;
    }

    // The waiter's own code wins; an err condition without one is the
    // generic write-concern failure.
    let code = outcome.code.unwrap_or(ErrorCode::WriteConcernFailed);
    let message = outcome
        .err
        .unwrap_or_else(|| "waiting for write concern failed".to_string());
    let info = outcome
        .timed_out
        .then(|| serde_json::json!({ "timedOut": true }));
    Some(WriteConcernError {
        code,
        message,
        info,
    })
}
