//! Denormalized documents, the shape written to the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::key::{RecordKey, StoreKey};
use crate::model::address::Address;
use crate::model::member::{
    full_name, MaritalStatus, MemberStatus, Service, Sex, Transaction,
};

/// A person embedded in a household document.
///
/// Persons are not stored on their own. `id` is minted by the run so that
/// history records and parent links have a stable target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDocument {
    pub id: StoreKey,
    pub family_name: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub previous_family_name: Option<String>,
    pub name_suffix: Option<String>,
    pub title: Option<String>,
    pub nick_name: Option<String>,
    pub sex: Sex,
    #[serde(default, with = "crate::model::date::optional")]
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub status: MemberStatus,
    pub resident: bool,
    pub ex_directory: bool,
    /// Import key until phase 2, store key afterwards.
    pub household: RecordKey,
    pub temp_address: Option<Address>,
    pub transactions: Vec<Transaction>,
    pub marital_status: MaritalStatus,
    pub spouse: Option<String>,
    #[serde(default, with = "crate::model::date::optional")]
    pub date_of_marriage: Option<NaiveDate>,
    pub divorce: Option<String>,
    pub father: Option<StoreKey>,
    pub mother: Option<StoreKey>,
    pub e_mail: Option<String>,
    pub work_e_mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub work_phone: Option<String>,
    pub education: Option<String>,
    pub employer: Option<String>,
    pub baptism: Option<String>,
    pub services: Vec<Service>,
    #[serde(default, with = "crate::model::date::optional")]
    pub date_last_changed: Option<NaiveDate>,
}

impl PersonDocument {
    /// Display name, as for [`Member::full_name`](crate::model::Member::full_name).
    #[must_use]
    pub fn full_name(&self) -> String {
        full_name(
            &self.family_name,
            &self.given_name,
            self.middle_name.as_deref(),
            self.previous_family_name.as_deref(),
            self.nick_name.as_deref(),
        )
    }
}

/// A household with its members and address embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdDocument {
    /// Import key before phase 1, store key after.
    pub id: RecordKey,
    pub head: PersonDocument,
    pub spouse: Option<PersonDocument>,
    pub others: Vec<PersonDocument>,
    pub address: Option<Address>,
}

impl HouseholdDocument {
    /// Every embedded person: head, spouse, then others.
    pub fn members(&self) -> impl Iterator<Item = &PersonDocument> {
        std::iter::once(&self.head)
            .chain(self.spouse.iter())
            .chain(self.others.iter())
    }

    /// Mutable access to every embedded person, in [`members`](Self::members) order.
    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut PersonDocument> {
        std::iter::once(&mut self.head)
            .chain(self.spouse.iter_mut())
            .chain(self.others.iter_mut())
    }

    /// True once every embedded household reference is a store key.
    #[must_use]
    pub fn is_fixed_up(&self) -> bool {
        self.members().all(|p| p.household.is_stored())
    }
}
