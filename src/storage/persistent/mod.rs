//! Persistent document store.
//!
//! A directory-based store for running a load without an external database:
//! - One append-only journal per collection
//! - File locking for single-process access
//! - CRC32 checksums for corruption detection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               FileDocumentStore              │
//! ├──────────────────────────────────────────────┤
//! │  households.journal   other.journal   ...    │
//! │  (codec frames)       (codec frames)         │
//! │                  ↓                           │
//! │         ┌─────────────────┐                  │
//! │         │ DirLock (.lock) │                  │
//! │         └─────────────────┘                  │
//! └──────────────────────────────────────────────┘
//! ```

mod codec;
mod file_lock;
mod journal;
mod store;

pub use file_lock::DirLock;
pub use journal::{Journal, JournalEntry, JournalEntryKind, Replay};
pub use store::FileDocumentStore;

use std::path::Path;

use crate::storage::StorageError;

/// Configuration for the file store.
#[derive(Debug, Clone)]
pub struct PersistentConfig {
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}

/// Open a file store at `dir` with the given (or default) configuration.
///
/// # Errors
/// See [`FileDocumentStore::open`].
pub fn open_store(
    dir: &Path,
    config: Option<PersistentConfig>,
) -> Result<FileDocumentStore, StorageError> {
    FileDocumentStore::open(dir, config.unwrap_or_default())
}
