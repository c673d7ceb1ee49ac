//! Run-scoped state shared by the load stages.
//!
//! Members with no household (the dead, mostly) must still live in some
//! household to be stored, and every household needs a head. A run therefore
//! carries one placeholder household key and its synthetic head. Both are
//! created once when the run starts and passed to the stages explicitly.

use crate::key::{ImportKey, RecordKey, StoreKey};
use crate::model::{MaritalStatus, MemberStatus, PersonDocument, Sex};

/// Prefix of the placeholder household's generated import key.
pub const PLACEHOLDER_KEY_PREFIX: &str = "mansion-in-the-sky";

/// Context of one load run.
#[derive(Debug, Clone)]
pub struct RunContext {
    placeholder_key: ImportKey,
    placeholder_head: PersonDocument,
    progress_every: usize,
}

impl RunContext {
    /// Creates a context with a fresh placeholder key.
    #[must_use]
    pub fn new(progress_every: usize) -> Self {
        Self::with_placeholder_key(ImportKey::synthetic(PLACEHOLDER_KEY_PREFIX), progress_every)
    }

    /// Creates a context with a caller-chosen placeholder key.
    #[must_use]
    pub fn with_placeholder_key(placeholder_key: ImportKey, progress_every: usize) -> Self {
        let placeholder_head = good_shepherd(&placeholder_key);
        Self {
            placeholder_key,
            placeholder_head,
            progress_every: progress_every.max(1),
        }
    }

    /// Import key of the placeholder household.
    #[must_use]
    pub const fn placeholder_key(&self) -> &ImportKey {
        &self.placeholder_key
    }

    /// Synthetic head of the placeholder household.
    #[must_use]
    pub const fn placeholder_head(&self) -> &PersonDocument {
        &self.placeholder_head
    }

    /// Progress logging interval.
    #[must_use]
    pub const fn progress_every(&self) -> usize {
        self.progress_every
    }

    /// True when the `n`th (zero-based) record should be logged.
    #[must_use]
    pub const fn should_log(&self, n: usize) -> bool {
        n % self.progress_every == 0
    }
}

/// The placeholder head: a pastor, so not counted as a communicant; not
/// resident; ex-directory.
fn good_shepherd(household: &ImportKey) -> PersonDocument {
    PersonDocument {
        id: StoreKey::generate(),
        family_name: "Shepherd".to_string(),
        given_name: "Good".to_string(),
        middle_name: None,
        previous_family_name: None,
        name_suffix: None,
        title: None,
        nick_name: None,
        sex: Sex::Male,
        date_of_birth: None,
        place_of_birth: Some("Bethlehem".to_string()),
        status: MemberStatus::Pastor,
        resident: false,
        ex_directory: true,
        household: RecordKey::Import(household.clone()),
        temp_address: None,
        transactions: Vec::new(),
        marital_status: MaritalStatus::Single,
        spouse: None,
        date_of_marriage: None,
        divorce: None,
        father: None,
        mother: None,
        e_mail: None,
        work_e_mail: None,
        mobile_phone: None,
        work_phone: None,
        education: None,
        employer: None,
        baptism: None,
        services: Vec::new(),
        date_last_changed: None,
    }
}
