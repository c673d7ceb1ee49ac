//! File-backed document store.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::key::StoreKey;
use crate::storage::memory::{ensure_object, CollectionState};
use crate::storage::traits::{DocumentStore, StorageError};

use super::file_lock::DirLock;
use super::journal::{Journal, JournalEntryKind, JOURNAL_EXTENSION};
use super::PersistentConfig;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

fn io_err(context: &str, err: &std::io::Error) -> StorageError {
    StorageError::Backend(format!("{context}: {err}"))
}

/// Collection names become file names.
fn validate_collection_name(name: &str) -> Result<(), StorageError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StorageError::Backend(format!("invalid collection name '{name}'")))
    }
}

struct OpenCollection {
    state: CollectionState,
    journal: Journal,
}

/// Durable document store keeping one journal per collection in a directory.
///
/// The full data set is held in memory; the journals make it survive
/// restarts. The directory is locked for the lifetime of the store.
pub struct FileDocumentStore {
    dir: PathBuf,
    config: PersistentConfig,
    collections: RwLock<HashMap<String, OpenCollection>>,
    _lock: DirLock,
}

impl std::fmt::Debug for FileDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDocumentStore")
            .field("dir", &self.dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FileDocumentStore {
    /// Open (or create) a store in `dir`, replaying existing journals.
    ///
    /// # Errors
    /// - `Connection` if another store holds the directory lock
    /// - `Backend` for I/O failures and corrupted journals
    pub fn open(dir: &Path, config: PersistentConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|e| io_err("create store directory", &e))?;
        let lock = DirLock::acquire(dir)?;

        let mut collections = HashMap::new();
        let entries = fs::read_dir(dir).map_err(|e| io_err("list store directory", &e))?;
        for entry in entries {
            let path = entry.map_err(|e| io_err("list store directory", &e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(JOURNAL_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let collection = Self::recover(&path, config.sync_on_write)?;
            info!(collection = %name, documents = collection.state.len(), "recovered collection");
            collections.insert(name, collection);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            collections: RwLock::new(collections),
            _lock: lock,
        })
    }

    /// Directory holding the journals.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn journal_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.{JOURNAL_EXTENSION}"))
    }

    fn recover(path: &Path, sync_on_write: bool) -> Result<OpenCollection, StorageError> {
        let replay = Journal::replay(path).map_err(|e| io_err("replay journal", &e))?;
        let sequence = replay.entries.last().map_or(0, |e| e.sequence);

        let mut state = CollectionState::default();
        for entry in replay.entries {
            match entry.kind {
                JournalEntryKind::Insert { key, document }
                | JournalEntryKind::Replace { key, document } => state.put(key, document),
            }
        }

        if replay.truncated_tail {
            // Appending after a torn frame would corrupt every later entry.
            return Self::compact(path, state, sync_on_write);
        }

        let journal = Journal::open(path, sequence, sync_on_write)
            .map_err(|e| io_err("open journal", &e))?;
        Ok(OpenCollection { state, journal })
    }

    /// Rewrite a journal so it holds exactly one insert per live document.
    fn compact(
        path: &Path,
        state: CollectionState,
        sync_on_write: bool,
    ) -> Result<OpenCollection, StorageError> {
        let tmp = path.with_extension("compact");
        let _ = fs::remove_file(&tmp);
        {
            let mut journal =
                Journal::open(&tmp, 0, sync_on_write).map_err(|e| io_err("compact journal", &e))?;
            for key in &state.order {
                if let Some(document) = state.by_key.get(key) {
                    journal
                        .append(JournalEntryKind::Insert {
                            key: key.clone(),
                            document: document.clone(),
                        })
                        .map_err(|e| io_err("compact journal", &e))?;
                }
            }
        }
        fs::rename(&tmp, path).map_err(|e| io_err("compact journal", &e))?;
        debug!(path = %path.display(), documents = state.len(), "compacted journal");

        let sequence = u64::try_from(state.order.len()).unwrap_or(u64::MAX);
        let journal =
            Journal::open(path, sequence, sync_on_write).map_err(|e| io_err("open journal", &e))?;
        Ok(OpenCollection { state, journal })
    }

    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut OpenCollection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        validate_collection_name(collection)?;
        let mut guard = self
            .collections
            .write()
            .map_err(|_| lock_err("file.write"))?;
        if !guard.contains_key(collection) {
            let path = self.journal_path(collection);
            let journal = Journal::open(&path, 0, self.config.sync_on_write)
                .map_err(|e| io_err("create journal", &e))?;
            guard.insert(
                collection.to_string(),
                OpenCollection {
                    state: CollectionState::default(),
                    journal,
                },
            );
        }
        let open = guard
            .get_mut(collection)
            .ok_or_else(|| StorageError::Backend(format!("collection '{collection}' vanished")))?;
        f(open)
    }
}

impl DocumentStore for FileDocumentStore {
    fn drop_collection(&self, collection: &str) -> Result<(), StorageError> {
        validate_collection_name(collection)?;
        let mut guard = self
            .collections
            .write()
            .map_err(|_| lock_err("file.drop"))?;
        let known = guard.contains_key(collection);

        // The collection stays readable until its journal is gone.
        let path = self.journal_path(collection);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !known {
                    return Err(StorageError::CollectionNotFound(collection.to_string()));
                }
                warn!(path = %path.display(), "journal already gone while dropping collection");
            }
            Err(e) => return Err(io_err("remove journal", &e)),
        }
        guard.remove(collection);
        Ok(())
    }

    fn insert(&self, collection: &str, document: Value) -> Result<StoreKey, StorageError> {
        ensure_object(&document)?;
        self.with_collection(collection, |open| {
            let key = StoreKey::generate();
            open.journal
                .append(JournalEntryKind::Insert {
                    key: key.clone(),
                    document: document.clone(),
                })
                .map_err(|e| io_err("append journal", &e))?;
            open.state.put(key.clone(), document);
            Ok(key)
        })
    }

    fn replace(
        &self,
        collection: &str,
        key: &StoreKey,
        document: Value,
        upsert: bool,
    ) -> Result<u64, StorageError> {
        ensure_object(&document)?;
        self.with_collection(collection, |open| {
            let matched = open.state.by_key.contains_key(key);
            if !matched && !upsert {
                return Ok(0);
            }
            open.journal
                .append(JournalEntryKind::Replace {
                    key: key.clone(),
                    document: document.clone(),
                })
                .map_err(|e| io_err("append journal", &e))?;
            open.state.put(key.clone(), document);
            Ok(u64::from(matched))
        })
    }

    fn get(&self, collection: &str, key: &StoreKey) -> Result<Option<Value>, StorageError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| lock_err("file.get"))?;
        Ok(guard
            .get(collection)
            .and_then(|open| open.state.by_key.get(key))
            .cloned())
    }

    fn count(&self, collection: &str) -> Result<usize, StorageError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| lock_err("file.count"))?;
        Ok(guard.get(collection).map_or(0, |open| open.state.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn config() -> PersistentConfig {
        PersistentConfig {
            sync_on_write: false,
        }
    }

    #[test]
    fn test_documents_survive_reopen() {
        let dir = tempdir().unwrap();
        let key = {
            let store = FileDocumentStore::open(dir.path(), config()).unwrap();
            let key = store.insert("households", json!({ "v": 1 })).unwrap();
            assert_eq!(store.replace("households", &key, json!({ "v": 2 }), false).unwrap(), 1);
            key
        };

        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        assert_eq!(store.count("households").unwrap(), 1);
        assert_eq!(store.get("households", &key).unwrap(), Some(json!({ "v": 2 })));
    }

    #[test]
    fn test_drop_missing_collection() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        assert!(store.drop_collection("households").unwrap_err().is_not_found());
    }

    #[test]
    fn test_drop_removes_journal() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        store.insert("households", json!({})).unwrap();
        assert!(dir.path().join("households.journal").exists());

        store.drop_collection("households").unwrap();
        assert!(!dir.path().join("households.journal").exists());
        assert_eq!(store.count("households").unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_drop_keeps_collection() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        let key = store.insert("households", json!({ "v": 1 })).unwrap();

        // A directory in the journal's place cannot be unlinked.
        let journal = dir.path().join("households.journal");
        fs::remove_file(&journal).unwrap();
        fs::create_dir(&journal).unwrap();

        let err = store.drop_collection("households").unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
        assert_eq!(store.count("households").unwrap(), 1);
        assert_eq!(store.get("households", &key).unwrap(), Some(json!({ "v": 1 })));
    }

    #[test]
    fn test_drop_after_journal_vanished() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        store.insert("households", json!({})).unwrap();
        fs::remove_file(dir.path().join("households.journal")).unwrap();

        store.drop_collection("households").unwrap();
        assert_eq!(store.count("households").unwrap(), 0);
        assert!(store.drop_collection("households").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rejects_unsafe_collection_names() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::open(dir.path(), config()).unwrap();
        let err = store.insert("../escape", json!({})).unwrap_err();
        assert!(!err.is_document_level());
    }

    #[test]
    fn test_second_open_is_refused() {
        let dir = tempdir().unwrap();
        let _store = FileDocumentStore::open(dir.path(), config()).unwrap();
        let err = FileDocumentStore::open(dir.path(), config()).unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }
}
