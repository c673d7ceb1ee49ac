//! Loader configuration.

use crate::error::{LoaderError, LoaderResult};

/// Default destination collection.
pub const DEFAULT_COLLECTION: &str = "households";

/// Default progress logging interval, in records.
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

/// Environment variable overriding the log level of the binary.
pub const LOG_LEVEL_ENV: &str = "PM_LOG_LEVEL";

/// Configuration of a load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Destination collection for household documents.
    pub collection: String,
    /// Log one progress line every this many records.
    pub progress_every: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl LoaderConfig {
    /// Set the destination collection.
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    /// Set the progress logging interval.
    #[must_use]
    pub fn progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Check the configuration, returning it unchanged when valid.
    ///
    /// # Errors
    /// `Config` for an empty or path-like collection name or a zero
    /// progress interval.
    pub fn validate(self) -> LoaderResult<Self> {
        if self.collection.trim().is_empty() {
            return Err(LoaderError::config("collection name must not be empty"));
        }
        if self.collection.contains('/') || self.collection.contains('\\') {
            return Err(LoaderError::config(format!(
                "collection name '{}' must not contain path separators",
                self.collection
            )));
        }
        if self.progress_every == 0 {
            return Err(LoaderError::config("progress_every must be at least 1"));
        }
        Ok(self)
    }
}
