//! Indexer: import key to record lookup tables.
//!
//! Indexing is the only place the export's "empty string means absent"
//! convention is handled. After [`Normalize::normalize`] every optional field
//! is either `None` or non-empty, and later stages never re-check.

use std::collections::HashMap;

use tracing::info;

use crate::error::{CollectionKind, DataError};
use crate::key::ImportKey;
use crate::model::{Address, Household, ImportRecord, Member, Service, Transaction};

/// Canonicalization applied to a record value when it is indexed.
pub trait Normalize {
    /// Turn every empty optional string into `None`.
    #[must_use]
    fn normalize(self) -> Self;

    /// Short description used in progress logs.
    fn describe(&self) -> String;
}

fn none_if_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

fn none_if_empty_key(k: Option<ImportKey>) -> Option<ImportKey> {
    k.filter(|v| !v.is_empty())
}

impl Normalize for Address {
    fn normalize(self) -> Self {
        Self {
            address2: none_if_empty(self.address2),
            state: none_if_empty(self.state),
            postal_code: none_if_empty(self.postal_code),
            country: none_if_empty(self.country),
            e_mail: none_if_empty(self.e_mail),
            home_phone: none_if_empty(self.home_phone),
            ..self
        }
    }

    fn describe(&self) -> String {
        format!("{}, {}", self.address, self.city)
    }
}

impl Normalize for Transaction {
    fn normalize(self) -> Self {
        Self {
            authority: none_if_empty(self.authority),
            church: none_if_empty(self.church),
            comment: none_if_empty(self.comment),
            ..self
        }
    }

    fn describe(&self) -> String {
        format!("{:?} {}", self.kind, self.index)
    }
}

impl Normalize for Service {
    fn normalize(self) -> Self {
        Self {
            place: none_if_empty(self.place),
            comment: none_if_empty(self.comment),
            ..self
        }
    }

    fn describe(&self) -> String {
        format!("{:?} {}", self.kind, self.index)
    }
}

impl Normalize for Member {
    fn normalize(self) -> Self {
        Self {
            middle_name: none_if_empty(self.middle_name),
            previous_family_name: none_if_empty(self.previous_family_name),
            name_suffix: none_if_empty(self.name_suffix),
            title: none_if_empty(self.title),
            nick_name: none_if_empty(self.nick_name),
            place_of_birth: none_if_empty(self.place_of_birth),
            household: none_if_empty_key(self.household),
            temp_address: none_if_empty_key(self.temp_address),
            transactions: self.transactions.into_iter().map(Normalize::normalize).collect(),
            spouse: none_if_empty(self.spouse),
            divorce: none_if_empty(self.divorce),
            father: none_if_empty_key(self.father),
            mother: none_if_empty_key(self.mother),
            e_mail: none_if_empty(self.e_mail),
            work_e_mail: none_if_empty(self.work_e_mail),
            mobile_phone: none_if_empty(self.mobile_phone),
            work_phone: none_if_empty(self.work_phone),
            education: none_if_empty(self.education),
            employer: none_if_empty(self.employer),
            baptism: none_if_empty(self.baptism),
            services: self.services.into_iter().map(Normalize::normalize).collect(),
            ..self
        }
    }

    fn describe(&self) -> String {
        self.full_name()
    }
}

impl Normalize for Household {
    fn normalize(self) -> Self {
        Self {
            spouse: none_if_empty_key(self.spouse),
            others: self.others.into_iter().map(none_if_empty_key).collect(),
            address: none_if_empty_key(self.address),
            ..self
        }
    }

    fn describe(&self) -> String {
        format!("headed by {}", self.head)
    }
}

/// Lookup table of one collection, keyed by import key.
///
/// Iteration follows input order.
#[derive(Debug, Clone)]
pub struct Index<V> {
    order: Vec<ImportKey>,
    by_key: HashMap<ImportKey, V>,
}

impl<V> Default for Index<V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<V> Index<V> {
    /// Look up a record.
    #[must_use]
    pub fn get(&self, key: &ImportKey) -> Option<&V> {
        self.by_key.get(key)
    }

    /// True if the key is indexed.
    #[must_use]
    pub fn contains(&self, key: &ImportKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no records were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&ImportKey, &V)> {
        self.order
            .iter()
            .filter_map(|k| self.by_key.get(k).map(|v| (k, v)))
    }
}

/// Build the lookup table for one collection.
///
/// # Errors
/// `DuplicateImportKey` if two records share an import key.
pub fn index<V: Normalize>(
    collection: CollectionKind,
    records: Vec<ImportRecord<V>>,
    progress_every: usize,
) -> Result<Index<V>, DataError> {
    let every = progress_every.max(1);
    let mut idx = Index {
        order: Vec::with_capacity(records.len()),
        by_key: HashMap::with_capacity(records.len()),
    };

    for (i, record) in records.into_iter().enumerate() {
        if idx.by_key.contains_key(&record.import_key) {
            return Err(DataError::DuplicateImportKey {
                collection,
                key: record.import_key,
            });
        }
        let value = record.value.normalize();
        if i % every == 0 {
            info!(%collection, key = %record.import_key, "{}", value.describe());
        }
        idx.order.push(record.import_key.clone());
        idx.by_key.insert(record.import_key, value);
    }

    info!(%collection, records = idx.len(), "indexed");
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sex, TransactionType};

    fn address(street: &str) -> Address {
        Address {
            address2: Some(String::new()),
            country: Some(String::new()),
            e_mail: Some("x@y.z".into()),
            home_phone: Some(String::new()),
            ..Address::new(street, "Springfield")
        }
    }

    #[test]
    fn test_address_empty_strings_become_none() {
        let a = address("1 Main").normalize();
        assert!(a.address2.is_none());
        assert!(a.country.is_none());
        assert!(a.home_phone.is_none());
        assert_eq!(a.e_mail.as_deref(), Some("x@y.z"));
        assert_eq!(a.address, "1 Main");
    }

    #[test]
    fn test_member_references_normalized() {
        let mut m = Member::new("Smith", "Ann", Sex::Female);
        m.household = Some(ImportKey::new(""));
        m.father = Some(ImportKey::new(""));
        m.mother = Some(ImportKey::new("M9"));
        m.nick_name = Some(String::new());
        m.transactions.push(Transaction {
            index: "t1".into(),
            date: None,
            kind: TransactionType::Birth,
            authority: Some(String::new()),
            church: Some("First".into()),
            comment: None,
        });

        let m = m.normalize();
        assert!(m.household.is_none());
        assert!(m.father.is_none());
        assert_eq!(m.mother, Some(ImportKey::new("M9")));
        assert!(m.nick_name.is_none());
        assert!(m.transactions[0].authority.is_none());
        assert_eq!(m.transactions[0].church.as_deref(), Some("First"));
    }

    #[test]
    fn test_household_empty_others_become_null() {
        let h = Household {
            head: ImportKey::new("M1"),
            spouse: Some(ImportKey::new("")),
            others: vec![Some(ImportKey::new("M2")), Some(ImportKey::new(""))],
            address: Some(ImportKey::new("")),
        }
        .normalize();
        assert!(h.spouse.is_none());
        assert!(h.address.is_none());
        assert_eq!(h.other_keys().count(), 1);
    }

    #[test]
    fn test_index_preserves_order_and_looks_up() {
        let records = vec![
            ImportRecord::new("A2", address("2 Main")),
            ImportRecord::new("A1", address("1 Main")),
        ];
        let idx = index(CollectionKind::Addresses, records, 1).unwrap();
        assert_eq!(idx.len(), 2);
        let keys: Vec<&str> = idx.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["A2", "A1"]);
        assert_eq!(idx.get(&ImportKey::new("A1")).unwrap().address, "1 Main");
        assert!(idx.get(&ImportKey::new("A3")).is_none());
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let records = vec![
            ImportRecord::new("A1", address("1 Main")),
            ImportRecord::new("A1", address("other")),
        ];
        let err = index(CollectionKind::Addresses, records, 10).unwrap_err();
        assert!(matches!(
            err,
            DataError::DuplicateImportKey { collection: CollectionKind::Addresses, ref key }
                if key.as_str() == "A1"
        ));
    }
}
