//! Phase 2: rewrite embedded household references to store keys.
//!
//! When phase 1 inserted a household, its members' household references
//! still held import keys, because no household had a store key yet. Now the
//! translation table is complete, so each document is rewritten and replaced
//! in place.

use tracing::{info, warn};

use crate::error::{DataError, LoaderError, LoaderResult};
use crate::key::{ImportKey, RecordKey, StoreKey};
use crate::load::writer::TranslationTable;
use crate::model::HouseholdDocument;
use crate::storage::{DocumentStore, StorageError};

/// Output of [`fixup`].
#[derive(Debug, Clone, Default)]
pub struct FixedUp {
    /// Documents in their final, fully cross-referenced form.
    pub documents: Vec<HouseholdDocument>,
    /// Documents whose replace matched nothing in the store.
    pub unmatched: Vec<StoreKey>,
}

/// Rewrite the household reference of every embedded member of the
/// household imported as `owner`.
///
/// References that already hold a store key are left alone.
///
/// # Errors
/// `UnresolvedTranslation` if a referenced household has no store key,
/// which happens when phase 1 dropped it.
pub fn translate_references(
    owner: &ImportKey,
    mut doc: HouseholdDocument,
    table: &TranslationTable,
) -> Result<HouseholdDocument, DataError> {
    for person in doc.members_mut() {
        let RecordKey::Import(import) = &person.household else {
            continue;
        };
        let Some(store_key) = table.get(import) else {
            return Err(DataError::UnresolvedTranslation {
                household: owner.clone(),
                member: person.full_name(),
                missing: import.clone(),
            });
        };
        person.household = RecordKey::Store(store_key.clone());
    }
    Ok(doc)
}

/// Translate every stored document and replace it in the store.
///
/// A replace that matches no document is logged and counted, not fatal.
///
/// # Errors
/// - `UnresolvedTranslation` (see [`translate_references`])
/// - `Internal` if a document's store key is missing from `table`
/// - any store error, including serialization failures
pub fn fixup(
    store: &dyn DocumentStore,
    collection: &str,
    stored: Vec<HouseholdDocument>,
    table: &TranslationTable,
) -> LoaderResult<FixedUp> {
    let mut out = FixedUp {
        documents: Vec::with_capacity(stored.len()),
        unmatched: Vec::new(),
    };

    for doc in stored {
        let RecordKey::Store(key) = doc.id.clone() else {
            return Err(LoaderError::internal(format!(
                "document {} was never stored",
                doc.id
            )));
        };
        let owner = table.import_key_of(&key).cloned().ok_or_else(|| {
            LoaderError::internal(format!("stored document {key} has no translation"))
        })?;
        let updated = translate_references(&owner, doc, table)?;

        let value = serde_json::to_value(&updated).map_err(StorageError::from)?;
        let matched = store.replace(collection, &key, value, false)?;
        if matched == 0 {
            warn!(key = %key, head = %updated.head.full_name(), "update failed; no stored household matched");
            out.unmatched.push(key);
        }
        out.documents.push(updated);
    }

    info!(
        collection = %collection,
        updated = out.documents.len() - out.unmatched.len(),
        unmatched = out.unmatched.len(),
        "phase 2 complete"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::model::PersonDocument;
    use crate::storage::InMemoryDocumentStore;

    fn person(ctx: &RunContext, household: &str) -> PersonDocument {
        let mut p = ctx.placeholder_head().clone();
        p.household = RecordKey::Import(ImportKey::new(household));
        p
    }

    fn household(ctx: &RunContext, id: RecordKey, member_households: &[&str]) -> HouseholdDocument {
        let mut members = member_households.iter().map(|h| person(ctx, h));
        HouseholdDocument {
            id,
            head: members.next().unwrap(),
            spouse: members.next(),
            others: members.collect(),
            address: None,
        }
    }

    #[test]
    fn test_translates_head_spouse_and_others() {
        let ctx = RunContext::new(10);
        let mut table = TranslationTable::new();
        table.record("H1".into(), StoreKey::from_raw("s1")).unwrap();
        table.record("H2".into(), StoreKey::from_raw("s2")).unwrap();

        let doc = household(&ctx, RecordKey::Store(StoreKey::from_raw("s1")), &["H1", "H1", "H2"]);
        let fixed = translate_references(&ImportKey::new("H1"), doc, &table).unwrap();
        assert!(fixed.is_fixed_up());
        assert_eq!(fixed.head.household, RecordKey::Store(StoreKey::from_raw("s1")));
        assert_eq!(fixed.others[0].household, RecordKey::Store(StoreKey::from_raw("s2")));
    }

    #[test]
    fn test_missing_translation_is_fatal() {
        let ctx = RunContext::new(10);
        let mut table = TranslationTable::new();
        table.record("H1".into(), StoreKey::from_raw("s1")).unwrap();

        let doc = household(&ctx, RecordKey::Store(StoreKey::from_raw("s1")), &["H1", "H2"]);
        let err = translate_references(&ImportKey::new("H1"), doc, &table).unwrap_err();
        match err {
            DataError::UnresolvedTranslation { household, member, missing } => {
                assert_eq!(household.as_str(), "H1");
                assert_eq!(member, "Shepherd, Good");
                assert_eq!(missing.as_str(), "H2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fixup_replaces_in_store() {
        let ctx = RunContext::new(10);
        let store = InMemoryDocumentStore::new();
        let draft = household(&ctx, RecordKey::Import("H1".into()), &["H1"]);
        let key = store
            .insert("households", serde_json::to_value(&draft).unwrap())
            .unwrap();
        let mut table = TranslationTable::new();
        table.record("H1".into(), key.clone()).unwrap();

        let mut stored = draft;
        stored.id = RecordKey::Store(key.clone());
        let out = fixup(&store, "households", vec![stored], &table).unwrap();

        assert!(out.unmatched.is_empty());
        let value = store.get("households", &key).unwrap().unwrap();
        let reread: HouseholdDocument = serde_json::from_value(value).unwrap();
        assert_eq!(reread.head.household, RecordKey::Store(key));
    }

    #[test]
    fn test_unmatched_replace_is_not_fatal() {
        let ctx = RunContext::new(10);
        let store = InMemoryDocumentStore::new();
        let ghost = StoreKey::generate();
        let mut table = TranslationTable::new();
        table.record("H1".into(), ghost.clone()).unwrap();

        let doc = household(&ctx, RecordKey::Store(ghost.clone()), &["H1"]);
        let out = fixup(&store, "households", vec![doc], &table).unwrap();
        assert_eq!(out.unmatched, vec![ghost]);
        assert_eq!(out.documents.len(), 1);
        assert_eq!(store.count("households").unwrap(), 0);
    }
}
