//! Partition-version tokens for sharding-consistency checks.
//!
//! A [`PartitionVersion`] identifies which epoch and ordering of a
//! collection's partitioning a client believes it is writing against.
//! Versions are only comparable for the same namespace; the validator in
//! the executor crate enforces that by looking versions up per namespace.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::types::Document;

/// Opaque comparable partition-version token.
///
/// `epoch` identifies a distinct partitioning of the collection; `major`
/// advances on ownership-changing events, `minor` on everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionVersion {
    /// Ownership-changing component.
    pub major: u32,
    /// Non-ownership component.
    pub minor: u32,
    /// Identity of the partitioning this version belongs to.
    pub epoch: Uuid,
}

impl PartitionVersion {
    /// Version of a collection that is not partitioned at all.
    pub const UNSHARDED: PartitionVersion = PartitionVersion {
        major: 0,
        minor: 0,
        epoch: Uuid::nil(),
    };

    /// Sentinel meaning "do not validate the version for this request".
    pub const IGNORED: PartitionVersion = PartitionVersion {
        major: 0,
        minor: 0,
        epoch: Uuid::from_u128(u128::MAX),
    };

    /// Create a version with an explicit epoch.
    pub fn new(major: u32, minor: u32, epoch: Uuid) -> Self {
        PartitionVersion {
            major,
            minor,
            epoch,
        }
    }

    /// True if this is the "ignore version" sentinel.
    pub fn is_ignored(&self) -> bool {
        *self == Self::IGNORED
    }

    /// Directional write-compatibility check against the locally-known
    /// version: epochs must match and the declared major component must be
    /// equal or newer. Reflexive.
    pub fn is_write_compatible_with(&self, local: &PartitionVersion) -> bool {
        if self.is_ignored() {
            return true;
        }
        self.epoch == local.epoch && self.major >= local.major
    }

    /// Structured representation for error `info` payloads.
    pub fn to_info(&self) -> JsonValue {
        json!({
            "v": [self.major, self.minor],
            "epoch": self.epoch.to_string(),
        })
    }
}

impl fmt::Display for PartitionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}||{}", self.major, self.minor, self.epoch)
    }
}

/// Locally cached partitioning metadata for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardMetadata {
    /// The locally-known partition version.
    pub version: PartitionVersion,
    /// The shard key pattern, when the collection is partitioned by one.
    /// Used to reject unique indexes that do not cover the shard key.
    pub key_pattern: Option<Document>,
}

impl ShardMetadata {
    /// Metadata for a partitioned collection with the given version and key.
    pub fn new(version: PartitionVersion, key_pattern: Option<Document>) -> Self {
        ShardMetadata {
            version,
            key_pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> Uuid {
        Uuid::from_u128(7)
    }

    #[test]
    fn test_compatibility_is_reflexive() {
        let v = PartitionVersion::new(3, 1, epoch());
        assert!(v.is_write_compatible_with(&v));
        assert!(PartitionVersion::UNSHARDED.is_write_compatible_with(&PartitionVersion::UNSHARDED));
    }

    #[test]
    fn test_newer_major_is_compatible() {
        let local = PartitionVersion::new(2, 0, epoch());
        let newer = PartitionVersion::new(3, 0, epoch());
        assert!(newer.is_write_compatible_with(&local));
    }

    #[test]
    fn test_older_major_is_stale() {
        let local = PartitionVersion::new(2, 0, epoch());
        let older = PartitionVersion::new(1, 4, epoch());
        assert!(!older.is_write_compatible_with(&local));
    }

    #[test]
    fn test_epoch_mismatch_is_stale() {
        let local = PartitionVersion::new(2, 0, epoch());
        let other = PartitionVersion::new(2, 0, Uuid::from_u128(8));
        assert!(!other.is_write_compatible_with(&local));
    }

    #[test]
    fn test_ignored_sentinel_is_always_compatible() {
        let local = PartitionVersion::new(9, 0, epoch());
        assert!(PartitionVersion::IGNORED.is_write_compatible_with(&local));
        assert!(PartitionVersion::IGNORED.is_ignored());
        assert!(!PartitionVersion::UNSHARDED.is_ignored());
    }

    #[test]
    fn test_info_payload_shape() {
        let v = PartitionVersion::new(2, 1, epoch());
        let info = v.to_info();
        assert_eq!(info["v"][0], 2);
        assert_eq!(info["v"][1], 1);
        assert!(info["epoch"].is_string());
    }
}
