//! The load pipeline.
//!
//! A run indexes the three collections, denormalizes households, inserts
//! them (phase 1, [`writer`]) and finally rewrites their embedded household
//! references to store keys (phase 2, [`fixup`]).
//!
//! The two write phases are not atomic. A fatal error in phase 2 leaves the
//! collection holding phase-1 documents whose references are still import
//! keys; rerunning the load replaces the whole collection.

pub mod fixup;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::LoaderConfig;
use crate::context::RunContext;
use crate::denormalize::{denormalize, SoftError};
use crate::error::{CollectionKind, LoaderResult};
use crate::index::index;
use crate::input::read_dataset_file;
use crate::key::StoreKey;
use crate::model::{Dataset, HouseholdDocument};
use crate::storage::DocumentStore;

pub use fixup::{fixup, translate_references, FixedUp};
pub use writer::{store_all, TranslationTable};

/// Summary of a completed run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Households in the input.
    pub households_read: usize,
    /// Documents produced by denormalization, placeholder included.
    pub denormalized: usize,
    /// Documents inserted by phase 1.
    pub stored: usize,
    /// Documents replaced by phase 2.
    pub fixed_up: usize,
    /// Store keys whose phase-2 replace matched nothing.
    pub unmatched: Vec<StoreKey>,
    /// Unresolved optional references.
    pub soft_errors: Vec<SoftError>,
    /// Final documents, as written by phase 2.
    pub documents: Vec<HouseholdDocument>,
    /// Import key to store key, for every stored household.
    pub translations: TranslationTable,
}

impl LoadReport {
    /// Documents denormalized but not stored.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.denormalized - self.stored
    }
}

/// Runs loads against one document store.
pub struct Loader {
    store: Arc<dyn DocumentStore>,
    config: LoaderConfig,
}

impl Loader {
    /// Creates a loader.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    /// The destination store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read an export file and load it.
    ///
    /// # Errors
    /// As for [`run`](Self::run), plus `Input` if the file cannot be read
    /// or parsed.
    pub fn run_file(&self, path: &Path) -> LoaderResult<LoadReport> {
        let dataset = read_dataset_file(path)?;
        self.run(dataset)
    }

    /// Load a dataset, replacing the destination collection.
    ///
    /// # Errors
    /// - `Config` if the configuration is invalid
    /// - `Data` for duplicate keys, dangling required references or an
    ///   unresolved household translation
    /// - `Storage` for store failures that are not confined to one document
    pub fn run(&self, dataset: Dataset) -> LoaderResult<LoadReport> {
        let config = self.config.clone().validate()?;
        let ctx = RunContext::new(config.progress_every);
        let households_read = dataset.households.len();

        let addresses = index(CollectionKind::Addresses, dataset.addresses, ctx.progress_every())?;
        let members = index(CollectionKind::Members, dataset.members, ctx.progress_every())?;
        let households = index(CollectionKind::Households, dataset.households, ctx.progress_every())?;

        let denormalized = denormalize(&ctx, &households, &members, &addresses)?;
        let denormalized_count = denormalized.documents.len();

        let (translations, stored) =
            store_all(self.store.as_ref(), &config.collection, denormalized.documents)?;
        let stored_count = stored.len();

        let fixed = fixup(self.store.as_ref(), &config.collection, stored, &translations)?;

        let report = LoadReport {
            households_read,
            denormalized: denormalized_count,
            stored: stored_count,
            fixed_up: fixed.documents.len() - fixed.unmatched.len(),
            unmatched: fixed.unmatched,
            soft_errors: denormalized.soft_errors,
            documents: fixed.documents,
            translations,
        };
        info!(
            collection = %config.collection,
            households = report.households_read,
            stored = report.stored,
            dropped = report.dropped(),
            soft_errors = report.soft_errors.len(),
            "load complete"
        );
        Ok(report)
    }
}
