//! Shard-version validation and the in-memory metadata cache.
//!
//! The validator compares a request's declared partition version with the
//! locally cached one for the target namespace. It must run while the
//! namespace's write lock is held: the lock makes the check and the write
//! it guards atomic with respect to concurrent metadata refreshes. The
//! cache itself is only best-effort consistent outside that section.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde_json::json;

use scribe_core::{
    ErrorCode, MetadataCache, Namespace, PartitionVersion, ShardMetadata, WriteError,
};

/// Result of validating a declared partition version.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionCheck {
    /// The write may proceed. Carries the cached metadata (if any) so the
    /// insert handler can run index/shard-key compatibility checks without
    /// a second lookup.
    Compatible {
        /// Locally cached metadata for the namespace.
        metadata: Option<ShardMetadata>,
    },
    /// The client's routing information is outdated; do not write.
    Stale {
        /// Version the request declared.
        received: PartitionVersion,
        /// Version known locally.
        wanted: PartitionVersion,
    },
}

/// Validate a declared version against the cache.
///
/// No declared version, or the `IGNORED` sentinel, skips validation.
/// Absent cache metadata means the collection is unsharded locally.
pub fn check_shard_version(
    cache: &dyn MetadataCache,
    ns: &Namespace,
    declared: Option<&PartitionVersion>,
) -> VersionCheck {
    let metadata = cache.get(ns);
    let received = match declared {
        Some(version) if !version.is_ignored() => *version,
        _ => return VersionCheck::Compatible { metadata },
    };
    let wanted = metadata
        .as_ref()
        .map(|md| md.version)
        .unwrap_or(PartitionVersion::UNSHARDED);
    if received.is_write_compatible_with(&wanted) {
        VersionCheck::Compatible { metadata }
    } else {
        VersionCheck::Stale { received, wanted }
    }
}

/// Build the per-item error for a stale version, carrying the wanted
/// version as structured info.
pub fn stale_error(received: &PartitionVersion, wanted: &PartitionVersion) -> WriteError {
    WriteError::new(
        ErrorCode::StaleShardVersion,
        format!(
            "stale shard version detected before write, received {received} but local version is {wanted}"
        ),
    )
    .with_info(json!({ "vWanted": wanted.to_info() }))
}

/// Process-wide in-memory metadata cache.
///
/// `refresh` copies from a test-settable authoritative table, standing in
/// for the config-server fetch a distributed deployment would do. Readers
/// and refreshes race benignly; correctness comes from re-validating under
/// the namespace write lock.
#[derive(Debug, Default)]
pub struct MemMetadataCache {
    cached: DashMap<Namespace, ShardMetadata>,
    authority: DashMap<Namespace, ShardMetadata>,
    refresh_unavailable: AtomicBool,
}

impl MemMetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        MemMetadataCache::default()
    }

    /// Seed the cached metadata for a namespace.
    pub fn set_cached(&self, ns: Namespace, metadata: ShardMetadata) {
        self.cached.insert(ns, metadata);
    }

    /// Set what a refresh for this namespace will install.
    pub fn set_authoritative(&self, ns: Namespace, metadata: ShardMetadata) {
        self.authority.insert(ns, metadata);
    }

    /// Make subsequent refreshes fail (simulates an unreachable source).
    pub fn set_refresh_unavailable(&self, unavailable: bool) {
        self.refresh_unavailable.store(unavailable, Ordering::Release);
    }
}

impl MetadataCache for MemMetadataCache {
    fn get(&self, ns: &Namespace) -> Option<ShardMetadata> {
        self.cached.get(ns).map(|entry| entry.value().clone())
    }

    fn refresh(
        &self,
        ns: &Namespace,
        _known_version: &PartitionVersion,
    ) -> Result<PartitionVersion, String> {
        if self.refresh_unavailable.load(Ordering::Acquire) {
            return Err("metadata source unavailable".to_string());
        }
        match self.authority.get(ns) {
            Some(entry) => {
                let metadata = entry.value().clone();
                let version = metadata.version;
                drop(entry);
                self.cached.insert(ns.clone(), metadata);
                Ok(version)
            }
            None => {
                self.cached.remove(ns);
                Ok(PartitionVersion::UNSHARDED)
            }
        }
    }
}
