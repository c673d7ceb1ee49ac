//! Error types for the loader.
//!
//! All errors are strongly typed using thiserror. Every error returned from a
//! load is fatal to the run; recoverable data problems are reported as
//! [`SoftError`](crate::denormalize::SoftError) values instead.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::key::ImportKey;
use crate::storage::StorageError;

/// The reference field a dangling key was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Household head.
    Head,
    /// Household spouse.
    Spouse,
    /// Other household member.
    Other,
    /// Household address.
    Address,
    /// A member's temporary address.
    TempAddress,
    /// A member's father.
    Father,
    /// A member's mother.
    Mother,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Head => "head",
            Self::Spouse => "spouse",
            Self::Other => "other",
            Self::Address => "address",
            Self::TempAddress => "temp address",
            Self::Father => "father",
            Self::Mother => "mother",
        };
        f.write_str(name)
    }
}

/// Source collection of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// `addresses` array of the export.
    Addresses,
    /// `members` array of the export.
    Members,
    /// `households` array of the export.
    Households,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addresses => write!(f, "addresses"),
            Self::Members => write!(f, "members"),
            Self::Households => write!(f, "households"),
        }
    }
}

/// Fatal data errors. The message always names the offending record and the
/// key that could not be resolved.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no record imported for {kind} '{missing}' of household '{household}'")]
    DanglingReference {
        kind: ReferenceKind,
        household: ImportKey,
        missing: ImportKey,
    },

    #[error("import key '{key}' appears more than once in {collection}")]
    DuplicateImportKey {
        collection: CollectionKind,
        key: ImportKey,
    },

    #[error("household '{household}' embeds {member}, a member of household '{missing}', which has no store key")]
    UnresolvedTranslation {
        household: ImportKey,
        member: String,
        missing: ImportKey,
    },
}

/// Errors reading the export file.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed export at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for InputError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Top-level error type for a load run.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid configuration: {message}")]
    Config {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl LoaderError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a data error.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Returns true if this is an input error.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns the data error, if any.
    #[must_use]
    pub const fn as_data(&self) -> Option<&DataError> {
        match self {
            Self::Data(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
