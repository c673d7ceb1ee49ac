//! # household-loader
//!
//! Loads a parish export of addresses, members and households into a
//! document store.
//!
//! The export is keyed by import keys, natural keys chosen by the system that
//! produced it. The store assigns its own keys on insert. Households are
//! stored as self-contained documents with their members and address
//! embedded, and every embedded member carries a reference back to its
//! household. That reference can only hold a store key once the household
//! has been inserted, so a load runs in two write phases:
//!
//! 1. **Index** each collection by import key.
//! 2. **Denormalize** households into [`HouseholdDocument`]s. Members with no
//!    household are gathered into a placeholder household.
//! 3. **Phase 1** inserts every document and records the store key assigned
//!    to each household.
//! 4. **Phase 2** rewrites the embedded household references to store keys
//!    and replaces each document in place.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use household_loader::{InMemoryDocumentStore, Loader, LoaderConfig};
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let loader = Loader::new(store, LoaderConfig::default());
//! let report = loader.run_file(Path::new("export.json"))?;
//! println!("stored {} households", report.stored);
//! # Ok::<(), household_loader::LoaderError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod denormalize;
pub mod error;
pub mod index;
pub mod input;
pub mod key;
pub mod load;
pub mod model;
pub mod storage;

pub use config::{LoaderConfig, DEFAULT_COLLECTION, DEFAULT_PROGRESS_EVERY, LOG_LEVEL_ENV};
pub use context::RunContext;
pub use denormalize::{denormalize, Denormalized, SoftError};
pub use error::{
    CollectionKind, DataError, InputError, LoaderError, LoaderResult, ReferenceKind,
};
pub use index::{index, Index, Normalize};
pub use input::{read_dataset, read_dataset_file};
pub use key::{ImportKey, RecordKey, StoreKey};
pub use load::{fixup, store_all, FixedUp, LoadReport, Loader, TranslationTable};
pub use model::{
    Address, Dataset, Household, HouseholdDocument, ImportRecord, Member, PersonDocument,
};
pub use storage::{DocumentStore, InMemoryDocumentStore, StorageError};
