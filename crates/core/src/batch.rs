//! Batch request types.
//!
//! A [`BatchRequest`] is one client-submitted, ordered group of same-kind
//! write operations. It is constructed by the command layer and read-only
//! afterwards; the executor identifies items purely by positional index.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::{Document, Namespace, OpKind};
use crate::version::PartitionVersion;

/// Uniform kind tag for a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    /// Every item inserts a document.
    Insert,
    /// Every item is a filter-driven update.
    Update,
    /// Every item is a filter-driven delete.
    Delete,
}

impl From<BatchKind> for OpKind {
    fn from(kind: BatchKind) -> Self {
        match kind {
            BatchKind::Insert => OpKind::Insert,
            BatchKind::Update => OpKind::Update,
            BatchKind::Delete => OpKind::Delete,
        }
    }
}

/// One write operation, tagged by kind.
///
/// The coordinator and item executor depend only on the kind tag and the
/// uniform dispatch in the handlers; payload shape stays behind the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteItem {
    /// Insert one document (or, against `system.indexes`, create an index).
    Insert {
        /// The document to insert.
        document: Document,
    },
    /// Update documents matching a filter.
    Update {
        /// Query filter selecting the documents to update.
        filter: Document,
        /// Update expression (operator document or full replacement).
        update: Document,
        /// Update every matching document instead of the first.
        multi: bool,
        /// Insert a new document when nothing matches.
        upsert: bool,
    },
    /// Delete documents matching a filter.
    Delete {
        /// Query filter selecting the documents to delete.
        filter: Document,
        /// `0` removes every match, `1` removes a single document.
        limit: u64,
    },
}

impl WriteItem {
    /// The kind tag of this item.
    pub fn kind(&self) -> BatchKind {
        match self {
            WriteItem::Insert { .. } => BatchKind::Insert,
            WriteItem::Update { .. } => BatchKind::Update,
            WriteItem::Delete { .. } => BatchKind::Delete,
        }
    }
}

/// An ordered collection of same-kind writes plus execution directives.
///
/// Immutable once constructed. Insertion order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Kind of every item in the batch.
    pub kind: BatchKind,
    /// Target namespace.
    pub namespace: Namespace,
    /// The operations, in execution order.
    pub items: Vec<WriteItem>,
    /// Stop at the first item failure.
    pub ordered: bool,
    /// Report per-item errors, upsert ids, and the last-op timestamp.
    pub verbose: bool,
    /// Partition version the client believes it is writing against.
    pub shard_version: Option<PartitionVersion>,
    /// Explicit write-concern document; the process default applies when
    /// absent.
    pub write_concern: Option<JsonValue>,
}

impl BatchRequest {
    fn new(kind: BatchKind, namespace: Namespace, items: Vec<WriteItem>) -> Self {
        debug_assert!(items.iter().all(|item| item.kind() == kind));
        BatchRequest {
            kind,
            namespace,
            items,
            ordered: true,
            verbose: true,
            shard_version: None,
            write_concern: None,
        }
    }

    /// Build an insert batch from documents.
    pub fn inserts(namespace: Namespace, documents: Vec<Document>) -> Self {
        let items = documents
            .into_iter()
            .map(|document| WriteItem::Insert { document })
            .collect();
        Self::new(BatchKind::Insert, namespace, items)
    }

    /// Build an update batch. Every item must be `WriteItem::Update`.
    pub fn updates(namespace: Namespace, items: Vec<WriteItem>) -> Self {
        Self::new(BatchKind::Update, namespace, items)
    }

    /// Build a delete batch. Every item must be `WriteItem::Delete`.
    pub fn deletes(namespace: Namespace, items: Vec<WriteItem>) -> Self {
        Self::new(BatchKind::Delete, namespace, items)
    }

    /// Set the ordered flag.
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Set the verbose flag.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Declare the partition version the client is routing against.
    pub fn with_shard_version(mut self, version: PartitionVersion) -> Self {
        self.shard_version = Some(version);
        self
    }

    /// Attach an explicit write-concern document.
    pub fn with_write_concern(mut self, spec: JsonValue) -> Self {
        self.write_concern = Some(spec);
        self
    }

    /// The namespace that versioning and locking must target for an item.
    ///
    /// Index-creation inserts name their real target inside the document;
    /// everything else targets the request namespace. Falls back to the
    /// request namespace when the document is malformed — the insert
    /// handler reports the precise error in that case.
    pub fn targeting_namespace(&self, index: usize) -> Namespace {
        if self.namespace.is_index_namespace() {
            if let Some(WriteItem::Insert { document }) = self.items.get(index) {
                if let Some(target) = document.get("ns").and_then(|v| v.as_str()) {
                    if let Ok(ns) = Namespace::parse(target) {
                        return ns;
                    }
                }
            }
        }
        self.namespace.clone()
    }
}
