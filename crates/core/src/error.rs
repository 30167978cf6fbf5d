//! Error types for the batch write engine.
//!
//! Two layers of errors exist and must not be confused:
//! - [`StoreError`] is what the storage collaborator raises. It is internal
//!   and never reaches a client.
//! - [`WriteError`] is the structured per-item error that lands in a
//!   [`BatchResult`](crate::result::BatchResult). Store errors are converted
//!   to write errors at the operation-handler boundary, and nowhere else.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::types::Namespace;

/// Result alias for storage-collaborator calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Stable error codes carried on per-item and write-concern errors.
///
/// The numeric values are part of the wire surface and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Invariant violation or unexpected internal failure.
    InternalError,
    /// Malformed document, filter, or update expression.
    BadValue,
    /// Catch-all for failures with no more specific classification.
    UnknownError,
    /// A specification document could not be parsed.
    FailedToParse,
    /// The target namespace does not exist.
    NamespaceNotFound,
    /// The declared partition version is stale relative to the local one.
    StaleShardVersion,
    /// The requested durability level could not be satisfied.
    WriteConcernFailed,
    /// The index cannot be created (e.g. incompatible with the shard key).
    CannotCreateIndex,
    /// An identical index already exists.
    IndexAlreadyExists,
    /// A document with the same `_id` already exists.
    DuplicateKey,
}

impl ErrorCode {
    /// Numeric wire code for this error.
    pub fn as_wire(&self) -> i32 {
        match self {
            ErrorCode::InternalError => 1,
            ErrorCode::BadValue => 2,
            ErrorCode::UnknownError => 8,
            ErrorCode::FailedToParse => 9,
            ErrorCode::NamespaceNotFound => 26,
            ErrorCode::StaleShardVersion => 63,
            ErrorCode::WriteConcernFailed => 64,
            ErrorCode::CannotCreateIndex => 67,
            ErrorCode::IndexAlreadyExists => 68,
            ErrorCode::DuplicateKey => 11000,
        }
    }
}

/// Structured per-item error reported in a batch result.
///
/// `info` carries machine-readable diagnostics for specific codes, e.g. the
/// wanted partition version (`{"vWanted": ...}`) on `StaleShardVersion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct WriteError {
    /// Stable error classification.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Optional structured diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<JsonValue>,
}

impl WriteError {
    /// Create a write error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        WriteError {
            code,
            message: message.into(),
            info: None,
        }
    }

    /// Attach a structured info payload.
    pub fn with_info(mut self, info: JsonValue) -> Self {
        self.info = Some(info);
        self
    }
}

/// Errors raised by the storage collaborator.
///
/// `ResourceNotReady` is special: it is a transient fault, not a logical
/// error. The item executor retries the item in place and the variant never
/// converts to a [`WriteError`] through the normal path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A needed resource is not yet resident; retry the operation unchanged.
    #[error("resource not yet available, operation should be retried")]
    ResourceNotReady,

    /// A document with the same `_id` already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Malformed document, filter, or update expression.
    #[error("bad value: {0}")]
    BadValue(String),

    /// An identical index already exists on the collection.
    #[error("index already exists: {0}")]
    IndexAlreadyExists(String),

    /// The target collection could not be created.
    #[error("could not create collection {0}")]
    CannotCreateCollection(Namespace),

    /// The target namespace does not exist.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(Namespace),

    /// Invariant violation inside the store.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Convert to the structured per-item error surface.
    ///
    /// Handlers call this for every variant except `ResourceNotReady`,
    /// which they propagate for the retry loop instead.
    pub fn to_write_error(&self) -> WriteError {
        let code = match self {
            StoreError::DuplicateKey(_) => ErrorCode::DuplicateKey,
            StoreError::BadValue(_) => ErrorCode::BadValue,
            StoreError::IndexAlreadyExists(_) => ErrorCode::IndexAlreadyExists,
            StoreError::CannotCreateCollection(_) => ErrorCode::InternalError,
            StoreError::NamespaceNotFound(_) => ErrorCode::NamespaceNotFound,
            StoreError::Internal(_) => ErrorCode::InternalError,
            StoreError::ResourceNotReady => ErrorCode::InternalError,
        };
        WriteError::new(code, self.to_string())
    }

    /// True for the transient fault that the item executor retries in place.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::ResourceNotReady)
    }
}
