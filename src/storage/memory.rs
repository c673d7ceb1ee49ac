//! In-memory storage backend.
//!
//! Thread-safe in-memory implementation of [`DocumentStore`]. It is intended
//! for tests, dry runs and as a reference implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::key::StoreKey;
use crate::storage::traits::{DocumentStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Documents of one collection, in insertion order.
#[derive(Debug, Default, Clone)]
pub(crate) struct CollectionState {
    pub(crate) order: Vec<StoreKey>,
    pub(crate) by_key: HashMap<StoreKey, Value>,
}

impl CollectionState {
    pub(crate) fn put(&mut self, key: StoreKey, document: Value) {
        if !self.by_key.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.by_key.insert(key, document);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }
}

/// Validate a document before it is accepted by a backend.
pub(crate) fn ensure_object(document: &Value) -> Result<(), StorageError> {
    if document.is_object() {
        Ok(())
    } else {
        Err(StorageError::DocumentRejected(format!(
            "documents must be JSON objects, got {}",
            json_kind(document)
        )))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Thread-safe in-memory document store.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, CollectionState>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents of a collection in insertion order.
    pub fn documents(&self, collection: &str) -> Result<Vec<(StoreKey, Value)>, StorageError> {
        let state = self
            .collections
            .read()
            .map_err(|_| lock_err("memory.documents"))?;
        let Some(coll) = state.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .order
            .iter()
            .filter_map(|k| coll.by_key.get(k).map(|doc| (k.clone(), doc.clone())))
            .collect())
    }

    /// Names of the collections that currently exist.
    pub fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        let state = self
            .collections
            .read()
            .map_err(|_| lock_err("memory.collection_names"))?;
        let mut names: Vec<String> = state.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn drop_collection(&self, collection: &str) -> Result<(), StorageError> {
        let mut state = self
            .collections
            .write()
            .map_err(|_| lock_err("memory.drop"))?;
        state
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))
    }

    fn insert(&self, collection: &str, document: Value) -> Result<StoreKey, StorageError> {
        ensure_object(&document)?;
        let mut state = self
            .collections
            .write()
            .map_err(|_| lock_err("memory.insert"))?;
        let key = StoreKey::generate();
        state
            .entry(collection.to_string())
            .or_default()
            .put(key.clone(), document);
        Ok(key)
    }

    fn replace(
        &self,
        collection: &str,
        key: &StoreKey,
        document: Value,
        upsert: bool,
    ) -> Result<u64, StorageError> {
        ensure_object(&document)?;
        let mut state = self
            .collections
            .write()
            .map_err(|_| lock_err("memory.replace"))?;

        let matched = state
            .get(collection)
            .is_some_and(|coll| coll.by_key.contains_key(key));
        if !matched && !upsert {
            return Ok(0);
        }
        state
            .entry(collection.to_string())
            .or_default()
            .put(key.clone(), document);
        Ok(u64::from(matched))
    }

    fn get(&self, collection: &str, key: &StoreKey) -> Result<Option<Value>, StorageError> {
        let state = self
            .collections
            .read()
            .map_err(|_| lock_err("memory.get"))?;
        Ok(state
            .get(collection)
            .and_then(|coll| coll.by_key.get(key))
            .cloned())
    }

    fn count(&self, collection: &str) -> Result<usize, StorageError> {
        let state = self
            .collections
            .read()
            .map_err(|_| lock_err("memory.count"))?;
        Ok(state.get(collection).map_or(0, CollectionState::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_assigns_distinct_keys() {
        let store = InMemoryDocumentStore::new();
        let a = store.insert("households", json!({ "n": 1 })).unwrap();
        let b = store.insert("households", json!({ "n": 2 })).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("households").unwrap(), 2);
        assert_eq!(store.get("households", &a).unwrap(), Some(json!({ "n": 1 })));
    }

    #[test]
    fn test_drop_missing_collection_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.drop_collection("households").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_drop_clears_documents() {
        let store = InMemoryDocumentStore::new();
        store.insert("households", json!({})).unwrap();
        store.drop_collection("households").unwrap();
        assert_eq!(store.count("households").unwrap(), 0);
        assert!(store.collection_names().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_object_documents() {
        let store = InMemoryDocumentStore::new();
        let err = store.insert("households", json!([1, 2])).unwrap_err();
        assert!(err.is_document_level());
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_replace_without_upsert() {
        let store = InMemoryDocumentStore::new();
        let key = store.insert("households", json!({ "v": 1 })).unwrap();

        assert_eq!(store.replace("households", &key, json!({ "v": 2 }), false).unwrap(), 1);
        assert_eq!(store.get("households", &key).unwrap(), Some(json!({ "v": 2 })));

        let missing = StoreKey::generate();
        assert_eq!(store.replace("households", &missing, json!({ "v": 3 }), false).unwrap(), 0);
        assert!(store.get("households", &missing).unwrap().is_none());
        assert_eq!(store.count("households").unwrap(), 1);
    }

    #[test]
    fn test_replace_with_upsert_inserts() {
        let store = InMemoryDocumentStore::new();
        let key = StoreKey::generate();
        assert_eq!(store.replace("households", &key, json!({ "v": 1 }), true).unwrap(), 0);
        assert_eq!(store.count("households").unwrap(), 1);
    }

    #[test]
    fn test_documents_preserve_insertion_order() {
        let store = InMemoryDocumentStore::new();
        let keys: Vec<StoreKey> = (0..5)
            .map(|i| store.insert("c", json!({ "i": i })).unwrap())
            .collect();
        let docs = store.documents("c").unwrap();
        let got: Vec<StoreKey> = docs.into_iter().map(|(k, _)| k).collect();
        assert_eq!(got, keys);
    }
}
