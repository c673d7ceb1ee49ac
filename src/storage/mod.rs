//! Document store interface and backends.

mod memory;
mod traits;

/// File-backed journaled store.
#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemoryDocumentStore;
pub use traits::{DocumentStore, StorageError};

#[cfg(feature = "persistent")]
pub use persistent::{open_store, FileDocumentStore, PersistentConfig};
