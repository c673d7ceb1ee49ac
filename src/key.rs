//! Record keys.
//!
//! Two key namespaces exist during a load and they never mix:
//!
//! - [`ImportKey`]: the natural key a record carries in the export file.
//!   Unique within its collection, meaningless to the destination store.
//! - [`StoreKey`]: the key the document store generates on insert.
//!
//! [`RecordKey`] holds either one, so a reference can be written before the
//! store key it will eventually point at exists.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key of a record in the source export.
///
/// # Examples
///
/// ```
/// use household_loader::ImportKey;
///
/// let key = ImportKey::new("H1");
/// assert_eq!(key.as_str(), "H1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportKey(String);

impl ImportKey {
    /// Wraps a raw import key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a key that cannot appear in an export (used for the
    /// placeholder household).
    #[must_use]
    pub fn synthetic(prefix: &str) -> Self {
        Self(format!("{prefix}-{}", Uuid::new_v4().simple()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ImportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImportKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ImportKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Key assigned by the document store.
///
/// Stores generate these; the loader never derives one from an
/// [`ImportKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);

impl StoreKey {
    /// Generates a fresh random key (32 lowercase hex digits).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps a key produced by a store backend.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key in either namespace.
///
/// Serialized as `{"import": "..."}` or `{"store": "..."}` so a stored
/// document always says which namespace its references live in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKey {
    /// Not yet translated.
    Import(ImportKey),
    /// Store-assigned.
    Store(StoreKey),
}

impl RecordKey {
    /// Returns true once the key points into the store namespace.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns the import key, if untranslated.
    #[must_use]
    pub const fn as_import(&self) -> Option<&ImportKey> {
        match self {
            Self::Import(key) => Some(key),
            Self::Store(_) => None,
        }
    }

    /// Returns the store key, if translated.
    #[must_use]
    pub const fn as_store(&self) -> Option<&StoreKey> {
        match self {
            Self::Store(key) => Some(key),
            Self::Import(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(key) => write!(f, "import:{key}"),
            Self::Store(key) => write!(f, "store:{key}"),
        }
    }
}

impl From<ImportKey> for RecordKey {
    fn from(key: ImportKey) -> Self {
        Self::Import(key)
    }
}

impl From<StoreKey> for RecordKey {
    fn from(key: StoreKey) -> Self {
        Self::Store(key)
    }
}
