//! Abstract document store interface.
//!
//! The loader only needs three write operations from its destination store:
//! drop a collection, insert a document (getting back a store-assigned key)
//! and replace a document by key. Documents cross this boundary as JSON
//! objects so any backend that can hold JSON can implement it:
//! - In-memory backend for tests and dry runs
//! - Journaled file backend (feature `persistent`)
//! - Network-backed document databases

use serde_json::Value;
use thiserror::Error;

use crate::key::StoreKey;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Collection does not exist (returned by drop).
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// The store refused this particular document.
    #[error("Document rejected: {0}")]
    DocumentRejected(String),

    /// The document could not be serialized for the store.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Returns true if the failure concerns one document only and the store
    /// is otherwise healthy.
    #[must_use]
    pub const fn is_document_level(&self) -> bool {
        matches!(self, Self::DocumentRejected(_) | Self::Serialization(_))
    }

    /// Returns true for the drop-of-missing-collection case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CollectionNotFound(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Storage trait for a collection-oriented document store.
///
/// Calls are blocking round trips. The loader issues them one at a time.
pub trait DocumentStore: Send + Sync {
    /// Remove a collection and all of its documents.
    ///
    /// # Errors
    /// - `CollectionNotFound`: the collection does not exist
    fn drop_collection(&self, collection: &str) -> Result<(), StorageError>;

    /// Insert a document, returning the key the store assigned to it.
    /// Creates the collection if needed.
    ///
    /// # Errors
    /// - `DocumentRejected` / `Serialization`: this document cannot be stored
    /// - `Connection` / `Backend`: the store itself failed
    fn insert(&self, collection: &str, document: Value) -> Result<StoreKey, StorageError>;

    /// Replace the document stored under `key`.
    ///
    /// Returns the number of documents matched (0 or 1). With `upsert` set, a
    /// missing document is inserted under `key` and 0 is returned.
    fn replace(
        &self,
        collection: &str,
        key: &StoreKey,
        document: Value,
        upsert: bool,
    ) -> Result<u64, StorageError>;

    /// Get a document by key.
    fn get(&self, collection: &str, key: &StoreKey) -> Result<Option<Value>, StorageError>;

    /// Count documents in a collection (0 if it does not exist).
    fn count(&self, collection: &str) -> Result<usize, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_document_store_object_safe(_: &dyn DocumentStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::CollectionNotFound("households".to_string());
        assert!(err.to_string().contains("Collection not found"));

        let err = StorageError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_document_level_classification() {
        assert!(StorageError::DocumentRejected("too big".into()).is_document_level());
        assert!(StorageError::Serialization("bad".into()).is_document_level());
        assert!(!StorageError::Connection("down".into()).is_document_level());
        assert!(!StorageError::Backend("io".into()).is_document_level());
        assert!(!StorageError::CollectionNotFound("x".into()).is_document_level());
        assert!(StorageError::CollectionNotFound("x".into()).is_not_found());
    }
}
