//! Core types and traits for ScribeDB's batch write engine.
//!
//! This crate defines the foundational types used throughout the system:
//! - Namespace, Document, DocumentId: what a write targets and carries
//! - BatchRequest, WriteItem, BatchKind: one client-submitted batch
//! - WriteOutcome, BatchResult: per-item and aggregate results
//! - PartitionVersion, ShardMetadata: sharding-consistency tokens
//! - WriteConcern: durability requirements
//! - ErrorCode, WriteError, StoreError: the error taxonomy
//! - Traits: the collaborator seams (Store, MetadataCache, OpLog,
//!   DurabilityWaiter, TelemetrySink)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod version;
pub mod write_concern;

// Re-export commonly used types and traits
pub use batch::{BatchKind, BatchRequest, WriteItem};
pub use error::{ErrorCode, StoreError, StoreResult, WriteError};
pub use result::{BatchResult, ItemError, UpsertDetail, WriteConcernError, WriteOutcome};
pub use traits::{
    DurabilityWaiter, MetadataCache, OpLog, Store, TelemetrySink, UpdateResult, WaitOutcome,
};
pub use types::{
    Document, DocumentId, InvalidNamespace, Namespace, OpKind, OpTimestamp, ID_FIELD,
    INDEX_COLLECTION,
};
pub use version::{PartitionVersion, ShardMetadata};
pub use write_concern::{WMode, WriteConcern, DEFAULT_WRITE_CONCERN_TIMEOUT};
