//! A single in-memory collection: documents keyed by `_id` plus an index
//! registry.
//!
//! FxHashMap gives O(1) id lookups with a fast non-crypto hash; filter
//! scans walk the map. Matching keys are sorted before selection so that
//! single-document updates and deletes pick a deterministic victim.

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use scribe_core::{Document, DocumentId, StoreError, StoreResult, UpdateResult, ID_FIELD};

use crate::filter::{
    apply_update, build_upsert_document, fix_document_for_insert, id_key, matches,
    validate_filter,
};

/// A registered index on a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Index name, synthesized from the key pattern when not given.
    pub name: String,
    /// Key pattern document, e.g. `{"name": 1}`.
    pub key: Document,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// One collection's documents and indexes.
#[derive(Debug, Default)]
pub struct Collection {
    docs: FxHashMap<String, Document>,
    indexes: Vec<IndexSpec>,
}

impl Collection {
    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Registered indexes.
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// True when a document with this identifier exists.
    pub fn contains_id(&self, id: &DocumentId) -> bool {
        self.docs.contains_key(&id_key(id))
    }

    /// Fetch a document by identifier.
    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.docs.get(&id_key(id))
    }

    /// Insert one document, normalizing it first. Duplicate identifiers
    /// are rejected.
    pub fn insert(&mut self, document: Document) -> StoreResult<DocumentId> {
        let fixed = fix_document_for_insert(&document)?;
        let id = fixed
            .get(ID_FIELD)
            .cloned()
            .ok_or_else(|| StoreError::Internal("normalized document lost its id".to_string()))?;
        let key = id_key(&id);
        if self.docs.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!("{ID_FIELD}: {id}")));
        }
        self.docs.insert(key, fixed);
        Ok(id)
    }

    /// Apply a filter-driven update.
    pub fn update(
        &mut self,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> StoreResult<UpdateResult> {
        validate_filter(filter)?;
        let mut matching = self.matching_keys(filter);
        if matching.is_empty() {
            if upsert {
                let document = build_upsert_document(filter, update)?;
                let id = self.insert(document)?;
                return Ok(UpdateResult {
                    matched: 0,
                    modified: 0,
                    upserted_id: Some(id),
                });
            }
            return Ok(UpdateResult {
                matched: 0,
                modified: 0,
                upserted_id: None,
            });
        }
        if !multi {
            matching.truncate(1);
        }
        let mut modified = 0;
        for key in &matching {
            if let Some(doc) = self.docs.get_mut(key) {
                if apply_update(doc, update)? {
                    modified += 1;
                }
            }
        }
        Ok(UpdateResult {
            matched: matching.len() as u64,
            modified,
            upserted_id: None,
        })
    }

    /// Delete matching documents; `limit == 1` removes a single document.
    pub fn delete(&mut self, filter: &Document, limit: u64) -> StoreResult<u64> {
        validate_filter(filter)?;
        let mut matching = self.matching_keys(filter);
        if limit == 1 {
            matching.truncate(1);
        }
        let mut removed = 0;
        for key in &matching {
            if self.docs.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Register an index from an index document.
    pub fn add_index(&mut self, spec: &Document) -> StoreResult<()> {
        let key = spec
            .get("key")
            .filter(|k| k.is_object())
            .cloned()
            .ok_or_else(|| {
                StoreError::BadValue("index spec requires a key pattern object".to_string())
            })?;
        let name = match spec.get("name").and_then(JsonValue::as_str) {
            Some(name) => name.to_string(),
            None => synthesize_index_name(&key),
        };
        let unique = spec.get("unique").and_then(JsonValue::as_bool).unwrap_or(false);
        if self
            .indexes
            .iter()
            .any(|ix| ix.name == name || ix.key == key)
        {
            return Err(StoreError::IndexAlreadyExists(name));
        }
        self.indexes.push(IndexSpec { name, key, unique });
        Ok(())
    }

    fn matching_keys(&self, filter: &Document) -> Vec<String> {
        // Fast path: equality on _id hits the map directly.
        if let Some(obj) = filter.as_object() {
            if obj.len() == 1 {
                if let Some(id) = obj.get(ID_FIELD) {
                    let key = id_key(id);
                    return if self.docs.contains_key(&key) {
                        vec![key]
                    } else {
                        Vec::new()
                    };
                }
            }
        }
        let mut keys: Vec<String> = self
            .docs
            .iter()
            .filter(|(_, doc)| matches(doc, filter))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

fn synthesize_index_name(key: &Document) -> String {
    let parts: Vec<String> = key
        .as_object()
        .map(|obj| obj.iter().map(|(f, v)| format!("{f}_{v}")).collect())
        .unwrap_or_default();
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> Collection {
        let mut coll = Collection::default();
        coll.insert(json!({"_id": 1, "name": "ada", "role": "eng"})).unwrap();
        coll.insert(json!({"_id": 2, "name": "grace", "role": "eng"})).unwrap();
        coll.insert(json!({"_id": 3, "name": "alan", "role": "ops"})).unwrap();
        coll
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut coll = seeded();
        let err = coll.insert(json!({"_id": 1})).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(coll.len(), 3);
    }

    #[test]
    fn test_update_single_is_deterministic() {
        let mut coll = seeded();
        let res = coll
            .update(&json!({"role": "eng"}), &json!({"$set": {"seen": true}}), false, false)
            .unwrap();
        assert_eq!(res.matched, 1);
        assert_eq!(res.modified, 1);
        // Smallest id wins.
        assert_eq!(coll.get(&json!(1)).unwrap()["seen"], true);
        assert!(coll.get(&json!(2)).unwrap().get("seen").is_none());
    }

    #[test]
    fn test_update_multi_counts_matched_and_modified() {
        let mut coll = seeded();
        let res = coll
            .update(&json!({"role": "eng"}), &json!({"$set": {"role": "eng"}}), true, false)
            .unwrap();
        assert_eq!(res.matched, 2);
        assert_eq!(res.modified, 0); // no-op set
    }

    #[test]
    fn test_upsert_inserts_when_nothing_matches() {
        let mut coll = seeded();
        let res = coll
            .update(&json!({"name": "linus"}), &json!({"$set": {"role": "ops"}}), false, true)
            .unwrap();
        assert!(res.did_insert());
        assert_eq!(res.matched, 0);
        assert_eq!(coll.len(), 4);
        let id = res.upserted_id.unwrap();
        assert_eq!(coll.get(&id).unwrap()["name"], "linus");
    }

    #[test]
    fn test_delete_with_limit_one() {
        let mut coll = seeded();
        assert_eq!(coll.delete(&json!({"role": "eng"}), 1).unwrap(), 1);
        assert_eq!(coll.len(), 2);
    }

    #[test]
    fn test_delete_unbounded() {
        let mut coll = seeded();
        assert_eq!(coll.delete(&json!({"role": "eng"}), 0).unwrap(), 2);
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_id_fast_path() {
        let coll = seeded();
        assert!(coll.contains_id(&json!(2)));
        assert!(!coll.contains_id(&json!(99)));
    }

    #[test]
    fn test_add_index_rejects_duplicates() {
        let mut coll = Collection::default();
        coll.add_index(&json!({"key": {"name": 1}, "name": "name_1"})).unwrap();
        let err = coll
            .add_index(&json!({"key": {"name": 1}, "name": "name_1"}))
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexAlreadyExists(_)));
        assert_eq!(coll.indexes().len(), 1);
    }

    #[test]
    fn test_add_index_synthesizes_name() {
        let mut coll = Collection::default();
        coll.add_index(&json!({"key": {"name": 1}})).unwrap();
        assert_eq!(coll.indexes()[0].name, "name_1");
        assert!(!coll.indexes()[0].unique);
    }

    #[test]
    fn test_add_index_requires_key() {
        let mut coll = Collection::default();
        assert!(coll.add_index(&json!({"name": "broken"})).is_err());
    }
}
