//! Data schema of the export and of stored documents.
//!
//! Plain data: the types here carry no loading behavior beyond serde. Field
//! names follow the export.

#![allow(missing_docs)]

mod address;
pub mod date;
mod document;
mod household;
mod member;

pub use address::Address;
pub use document::{HouseholdDocument, PersonDocument};
pub use household::Household;
pub use member::{
    MaritalStatus, Member, MemberStatus, Service, ServiceType, Sex, Transaction, TransactionType,
};

use serde::{Deserialize, Serialize};

use crate::key::ImportKey;

/// One record of an export collection.
///
/// Instantiated once per collection (`ImportRecord<Address>`,
/// `ImportRecord<Member>`, `ImportRecord<Household>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord<V> {
    pub import_key: ImportKey,
    pub value: V,
}

impl<V> ImportRecord<V> {
    /// Creates a record.
    pub fn new(import_key: impl Into<ImportKey>, value: V) -> Self {
        Self {
            import_key: import_key.into(),
            value,
        }
    }
}

/// The whole export file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub members: Vec<ImportRecord<Member>>,
    pub households: Vec<ImportRecord<Household>>,
    pub addresses: Vec<ImportRecord<Address>>,
}
