//! In-memory `Store` implementation.
//!
//! Collections live in a DashMap keyed by namespace. The batch executor
//! serializes writers per namespace with its own lock table, so the map's
//! shard locks only guard the map structure itself.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use tracing::debug;

use scribe_core::{
    Document, DocumentId, Namespace, Store, StoreError, StoreResult, UpdateResult,
};

use crate::collection::Collection;

/// In-memory document store.
///
/// `fail_next_not_ready` arms a transient-fault injector: the next `n`
/// write calls return `StoreError::ResourceNotReady` before touching any
/// collection, which is how the retry loop in the executor is exercised.
#[derive(Debug, Default)]
pub struct MemStore {
    collections: DashMap<Namespace, Collection>,
    not_ready_budget: AtomicU32,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemStore::default()
    }

    /// Make the next `n` write calls fail with `ResourceNotReady`.
    pub fn fail_next_not_ready(&self, n: u32) {
        self.not_ready_budget.store(n, Ordering::Release);
    }

    /// Number of documents in a namespace (0 when absent).
    pub fn count(&self, ns: &Namespace) -> u64 {
        self.collections
            .get(ns)
            .map(|coll| coll.len() as u64)
            .unwrap_or(0)
    }

    /// True when the namespace holds a document with this identifier.
    pub fn contains_id(&self, ns: &Namespace, id: &DocumentId) -> bool {
        self.collections
            .get(ns)
            .map(|coll| coll.contains_id(id))
            .unwrap_or(false)
    }

    /// Number of indexes registered on a namespace.
    pub fn index_count(&self, ns: &Namespace) -> usize {
        self.collections
            .get(ns)
            .map(|coll| coll.indexes().len())
            .unwrap_or(0)
    }

    fn take_fault(&self) -> StoreResult<()> {
        let mut current = self.not_ready_budget.load(Ordering::Acquire);
        while current > 0 {
            match self.not_ready_budget.compare_exchange(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Err(StoreError::ResourceNotReady),
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }
}

impl Store for MemStore {
    fn create_if_absent(&self, ns: &Namespace) -> StoreResult<()> {
        self.collections.entry(ns.clone()).or_default();
        Ok(())
    }

    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<DocumentId> {
        self.take_fault()?;
        let mut coll = self
            .collections
            .get_mut(ns)
            .ok_or_else(|| StoreError::NamespaceNotFound(ns.clone()))?;
        let id = coll.insert(document)?;
        debug!(ns = %ns, id = %id, "inserted document");
        Ok(id)
    }

    fn update(
        &self,
        ns: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> StoreResult<UpdateResult> {
        self.take_fault()?;
        let result = match self.collections.get_mut(ns) {
            Some(mut coll) => coll.update(filter, update, multi, upsert)?,
            None if upsert => {
                let mut coll = self.collections.entry(ns.clone()).or_default();
                coll.update(filter, update, multi, upsert)?
            }
            None => UpdateResult {
                matched: 0,
                modified: 0,
                upserted_id: None,
            },
        };
        debug!(
            ns = %ns,
            matched = result.matched,
            modified = result.modified,
            upserted = result.did_insert(),
            "applied update"
        );
        Ok(result)
    }

    fn delete(&self, ns: &Namespace, filter: &Document, limit: u64) -> StoreResult<u64> {
        self.take_fault()?;
        let removed = match self.collections.get_mut(ns) {
            Some(mut coll) => coll.delete(filter, limit)?,
            None => 0,
        };
        debug!(ns = %ns, removed, "applied delete");
        Ok(removed)
    }

    fn create_index(&self, ns: &Namespace, spec: &Document) -> StoreResult<()> {
        let mut coll = self
            .collections
            .get_mut(ns)
            .ok_or_else(|| StoreError::NamespaceNotFound(ns.clone()))?;
        coll.add_index(spec)?;
        debug!(ns = %ns, "created index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::new("app", "users")
    }

    #[test]
    fn test_insert_requires_collection() {
        let store = MemStore::new();
        let err = store.insert(&ns(), json!({"_id": 1})).unwrap_err();
        assert!(matches!(err, StoreError::NamespaceNotFound(_)));
        store.create_if_absent(&ns()).unwrap();
        store.insert(&ns(), json!({"_id": 1})).unwrap();
        assert_eq!(store.count(&ns()), 1);
    }

    #[test]
    fn test_update_missing_namespace_matches_nothing() {
        let store = MemStore::new();
        let res = store
            .update(&ns(), &json!({"a": 1}), &json!({"$set": {"b": 2}}), false, false)
            .unwrap();
        assert_eq!(res.matched, 0);
        assert_eq!(store.count(&ns()), 0);
    }

    #[test]
    fn test_upsert_creates_namespace_implicitly() {
        let store = MemStore::new();
        let res = store
            .update(&ns(), &json!({"a": 1}), &json!({"$set": {"b": 2}}), false, true)
            .unwrap();
        assert!(res.did_insert());
        assert_eq!(store.count(&ns()), 1);
    }

    #[test]
    fn test_delete_missing_namespace_is_zero() {
        let store = MemStore::new();
        assert_eq!(store.delete(&ns(), &json!({}), 0).unwrap(), 0);
    }

    #[test]
    fn test_fault_injection_budget() {
        let store = MemStore::new();
        store.create_if_absent(&ns()).unwrap();
        store.fail_next_not_ready(2);
        assert!(matches!(
            store.insert(&ns(), json!({"_id": 1})),
            Err(StoreError::ResourceNotReady)
        ));
        assert!(matches!(
            store.insert(&ns(), json!({"_id": 1})),
            Err(StoreError::ResourceNotReady)
        ));
        // Budget exhausted, the retried call lands.
        store.insert(&ns(), json!({"_id": 1})).unwrap();
        assert!(store.contains_id(&ns(), &json!(1)));
    }

    #[test]
    fn test_create_index_requires_collection() {
        let store = MemStore::new();
        let err = store
            .create_index(&ns(), &json!({"key": {"a": 1}}))
            .unwrap_err();
        assert!(matches!(err, StoreError::NamespaceNotFound(_)));
    }
}
