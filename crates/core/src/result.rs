//! Per-item and aggregate result types.
//!
//! Field names on the serialized surface are fixed: `modifiedCount`,
//! `writeConcernError`, `lastOp`, and per-error `{index, code, message,
//! info}` are part of the response contract.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ErrorCode, WriteError};
use crate::types::{DocumentId, OpTimestamp};

/// Outcome of a single write item. Exactly one of success or failure holds.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The item was applied. `upserted_id` is set only when an update
    /// turned into an insert.
    Success {
        /// Generated identifier of an upserted document.
        upserted_id: Option<DocumentId>,
    },
    /// The item failed with a structured error.
    Failure(WriteError),
}

impl WriteOutcome {
    /// Plain success with no generated identifier.
    pub fn success() -> Self {
        WriteOutcome::Success { upserted_id: None }
    }

    /// Success of an update that inserted a document.
    pub fn upserted(id: DocumentId) -> Self {
        WriteOutcome::Success {
            upserted_id: Some(id),
        }
    }

    /// True for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success { .. })
    }
}

impl From<WriteError> for WriteOutcome {
    fn from(error: WriteError) -> Self {
        WriteOutcome::Failure(error)
    }
}

/// A per-item error annotated with the item's batch index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    /// Index of the failed item within the batch.
    pub index: usize,
    /// The structured error.
    #[serde(flatten)]
    pub error: WriteError,
}

/// Index and generated identifier of an update that performed an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertDetail {
    /// Index of the upserting item within the batch.
    pub index: usize,
    /// Generated document identifier.
    pub id: DocumentId,
}

/// Durability failure reported alongside (not instead of) item results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteConcernError {
    /// Stable error classification.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured diagnostics; `{"timedOut": true}` when the wait timed out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<JsonValue>,
}

/// Aggregate result of one batch execution.
///
/// `ok` is true on every normal completion; failure is communicated only
/// through `errors` and `write_concern_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Always true once execution completes.
    pub ok: bool,
    /// Total number of documents affected across all successful items.
    pub n: u64,
    /// Number of existing documents actually changed. Update batches only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_count: Option<u64>,
    /// Per-item errors, in batch order. Populated only when verbose.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
    /// Upsert details, in batch order. Populated only when verbose.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upserted: Vec<UpsertDetail>,
    /// Durability failure, if the write concern could not be satisfied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_concern_error: Option<WriteConcernError>,
    /// Timestamp of the latest operation this batch produced. Populated
    /// only when verbose and an op log is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_op: Option<OpTimestamp>,
}

impl Default for BatchResult {
    fn default() -> Self {
        BatchResult {
            ok: false,
            n: 0,
            modified_count: None,
            errors: Vec::new(),
            upserted: Vec::new(),
            write_concern_error: None,
            last_op: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_variants() {
        assert!(WriteOutcome::success().is_success());
        assert!(WriteOutcome::upserted(json!("id-1")).is_success());
        let failed: WriteOutcome = WriteError::new(ErrorCode::BadValue, "bad").into();
        assert!(!failed.is_success());
    }

    #[test]
    fn test_item_error_serializes_flat() {
        let item = ItemError {
            index: 3,
            error: WriteError::new(ErrorCode::DuplicateKey, "dup"),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["code"], "DuplicateKey");
        assert_eq!(value["message"], "dup");
        assert!(value.get("info").is_none());
    }

    #[test]
    fn test_result_surface_field_names() {
        let result = BatchResult {
            ok: true,
            n: 2,
            modified_count: Some(1),
            write_concern_error: Some(WriteConcernError {
                code: ErrorCode::WriteConcernFailed,
                message: "timed out".to_string(),
                info: Some(json!({"timedOut": true})),
            }),
            last_op: Some(OpTimestamp(9)),
            ..BatchResult::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["modifiedCount"], 1);
        assert_eq!(value["writeConcernError"]["info"]["timedOut"], true);
        assert_eq!(value["lastOp"], 9);
        assert!(value.get("errors").is_none());
    }
}
