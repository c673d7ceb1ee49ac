//! Phase 1: insert denormalized documents and collect store keys.

use std::collections::HashMap;

use tracing::{error, info};

use crate::error::{LoaderError, LoaderResult};
use crate::key::{ImportKey, RecordKey, StoreKey};
use crate::model::HouseholdDocument;
use crate::storage::{DocumentStore, StorageError};

/// Import key to store key, for one collection in one run.
///
/// Entries are written once, when their document is inserted, and never
/// changed afterwards. Lookups work in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: HashMap<ImportKey, StoreKey>,
    reverse: HashMap<StoreKey, ImportKey>,
}

impl TranslationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the store key of an inserted document.
    ///
    /// # Errors
    /// `Internal` if the import key already has a translation.
    pub fn record(&mut self, import: ImportKey, store: StoreKey) -> LoaderResult<()> {
        if let Some(existing) = self.entries.get(&import) {
            return Err(LoaderError::internal(format!(
                "import key '{import}' already translated to {existing}"
            )));
        }
        self.reverse.insert(store.clone(), import.clone());
        self.entries.insert(import, store);
        Ok(())
    }

    /// Store key of an import key.
    #[must_use]
    pub fn get(&self, import: &ImportKey) -> Option<&StoreKey> {
        self.entries.get(import)
    }

    /// Import key of a stored document.
    #[must_use]
    pub fn import_key_of(&self, store: &StoreKey) -> Option<&ImportKey> {
        self.reverse.get(store)
    }

    /// True if the import key was stored.
    #[must_use]
    pub fn contains(&self, import: &ImportKey) -> bool {
        self.entries.contains_key(import)
    }

    /// Number of translated keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All translations, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&ImportKey, &StoreKey)> {
        self.entries.iter()
    }
}

/// Clear `collection`, then insert `documents` in order.
///
/// The collection's previous contents are destroyed: this is a full-replace
/// load. A document the store refuses is logged and left out of both the
/// table and the returned documents; the run goes on without it.
///
/// # Errors
/// Any store failure other than a missing collection on drop or a
/// document-level insert failure.
pub fn store_all(
    store: &dyn DocumentStore,
    collection: &str,
    documents: Vec<HouseholdDocument>,
) -> LoaderResult<(TranslationTable, Vec<HouseholdDocument>)> {
    match store.drop_collection(collection) {
        Ok(()) => info!(collection = %collection, "dropped collection"),
        Err(e) if e.is_not_found() => {
            error!(collection = %collection, error = %e, "drop failed; collection did not exist");
        }
        Err(e) => return Err(e.into()),
    }

    let total = documents.len();
    let mut table = TranslationTable::new();
    let mut stored = Vec::with_capacity(total);

    for mut doc in documents {
        let RecordKey::Import(import_key) = doc.id.clone() else {
            return Err(LoaderError::internal(format!(
                "document {} was already stored",
                doc.id
            )));
        };

        let inserted = serde_json::to_value(&doc)
            .map_err(StorageError::from)
            .and_then(|value| store.insert(collection, value));
        match inserted {
            Ok(store_key) => {
                info!(household = %import_key, key = %store_key, "stored household");
                table.record(import_key, store_key.clone())?;
                doc.id = RecordKey::Store(store_key);
                stored.push(doc);
            }
            Err(e) if e.is_document_level() => {
                error!(household = %import_key, error = %e, "insert failed; household dropped from load");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        collection = %collection,
        stored = stored.len(),
        dropped = total - stored.len(),
        "phase 1 complete"
    );
    Ok((table, stored))
}
