//! Foundational types: namespaces, documents, and operation timestamps.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A document is a JSON object; the identifier lives in the `_id` field.
pub type Document = JsonValue;

/// A document identifier: any JSON scalar. Generated ids are UUID strings.
pub type DocumentId = JsonValue;

/// Name of the document identifier field.
pub const ID_FIELD: &str = "_id";

/// Pseudo-collection whose inserts are index-creation requests.
pub const INDEX_COLLECTION: &str = "system.indexes";

/// Raised when a namespace string is not of the form `db.collection`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid namespace: {0:?}")]
pub struct InvalidNamespace(pub String);

/// A fully-qualified collection name, `db.collection`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    db: String,
    coll: String,
}

impl Namespace {
    /// Create a namespace from database and collection parts.
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Self {
        Namespace {
            db: db.into(),
            coll: coll.into(),
        }
    }

    /// Parse a `db.collection` string. The collection part may itself
    /// contain dots (`db.system.indexes`).
    pub fn parse(s: &str) -> Result<Self, InvalidNamespace> {
        match s.split_once('.') {
            Some((db, coll)) if !db.is_empty() && !coll.is_empty() => {
                Ok(Namespace::new(db, coll))
            }
            _ => Err(InvalidNamespace(s.to_string())),
        }
    }

    /// Database part.
    pub fn db(&self) -> &str {
        &self.db
    }

    /// Collection part.
    pub fn coll(&self) -> &str {
        &self.coll
    }

    /// True if inserts into this namespace are index-creation requests.
    pub fn is_index_namespace(&self) -> bool {
        self.coll == INDEX_COLLECTION
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}

/// The kind of a single write operation, used for telemetry and the op log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Document insert (including index creation).
    Insert,
    /// Filter-driven update.
    Update,
    /// Filter-driven delete.
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpKind::Insert => "insert",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Monotonic logical timestamp assigned by the op log.
///
/// Zero is reserved for "no operation recorded yet"; the first appended
/// operation gets timestamp 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct OpTimestamp(pub u64);

impl fmt::Display for OpTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_parse_roundtrip() {
        let ns = Namespace::parse("app.users").unwrap();
        assert_eq!(ns.db(), "app");
        assert_eq!(ns.coll(), "users");
        assert_eq!(ns.to_string(), "app.users");
    }

    #[test]
    fn test_namespace_parse_nested_collection() {
        let ns = Namespace::parse("app.system.indexes").unwrap();
        assert_eq!(ns.coll(), "system.indexes");
        assert!(ns.is_index_namespace());
    }

    #[test]
    fn test_namespace_parse_rejects_bare_name() {
        assert!(Namespace::parse("users").is_err());
        assert!(Namespace::parse(".users").is_err());
        assert!(Namespace::parse("app.").is_err());
    }

    #[test]
    fn test_op_timestamp_ordering() {
        assert!(OpTimestamp(2) > OpTimestamp(1));
        assert_eq!(OpTimestamp::default(), OpTimestamp(0));
    }
}
