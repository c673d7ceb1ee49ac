//! Member (person) records and their closed enumerations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::key::ImportKey;

/// Sex of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

/// Marital status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
}

/// Membership status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Noncommuning,
    Communing,
    Associate,
    Excommunicated,
    Suspended,
    DismissalPending,
    Dismissed,
    Removed,
    Dead,
    Pastor,
}

/// Kind of membership transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Birth,
    Profession,
    Received,
    Suspended,
    SuspensionLifted,
    Excommunicated,
    Restored,
    DismissalPending,
    Dismissed,
    RemovedAdmin,
    Died,
}

/// Kind of office-bearer service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    OrdainedTe,
    OrdainedRe,
    OrdainedDe,
    InstalledTe,
    InstalledRe,
    InstalledDe,
    Removed,
    Emeritus,
    HonRetired,
    Deposed,
}

/// One entry of a member's transaction history.
///
/// `index` is a secondary key in the export; in stored documents it is the
/// key of the owning person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub index: String,
    #[serde(default, with = "crate::model::date::optional")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub authority: Option<String>,
    pub church: Option<String>,
    pub comment: Option<String>,
}

/// One entry of a member's service history. `index` behaves as in
/// [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub index: String,
    #[serde(default, with = "crate::model::date::optional")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: ServiceType,
    pub place: Option<String>,
    pub comment: Option<String>,
}

/// A member as exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
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
    /// Absent for members who belong to no household (typically the dead).
    pub household: Option<ImportKey>,
    pub temp_address: Option<ImportKey>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub marital_status: MaritalStatus,
    /// Spouse's name as free text, not a reference.
    pub spouse: Option<String>,
    #[serde(default, with = "crate::model::date::optional")]
    pub date_of_marriage: Option<NaiveDate>,
    pub divorce: Option<String>,
    pub father: Option<ImportKey>,
    pub mother: Option<ImportKey>,
    pub e_mail: Option<String>,
    pub work_e_mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub work_phone: Option<String>,
    pub education: Option<String>,
    pub employer: Option<String>,
    pub baptism: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default, with = "crate::model::date::optional")]
    pub date_last_changed: Option<NaiveDate>,
}

impl Member {
    /// Creates a member with the given names and neutral defaults.
    #[must_use]
    pub fn new(family_name: impl Into<String>, given_name: impl Into<String>, sex: Sex) -> Self {
        Self {
            family_name: family_name.into(),
            given_name: given_name.into(),
            middle_name: None,
            previous_family_name: None,
            name_suffix: None,
            title: None,
            nick_name: None,
            sex,
            date_of_birth: None,
            place_of_birth: None,
            status: MemberStatus::Communing,
            resident: true,
            ex_directory: false,
            household: None,
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

    /// Display name: `Family, Given Middle (Previous) "Nick"`.
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

pub(crate) fn full_name(
    family: &str,
    given: &str,
    middle: Option<&str>,
    previous: Option<&str>,
    nick: Option<&str>,
) -> String {
    let mut name = format!("{family}, {given}");
    if let Some(m) = middle.filter(|s| !s.is_empty()) {
        name.push(' ');
        name.push_str(m);
    }
    if let Some(p) = previous.filter(|s| !s.is_empty()) {
        name.push_str(&format!(" ({p})"));
    }
    if let Some(n) = nick.filter(|s| !s.is_empty()) {
        name.push_str(&format!(" \"{n}\""));
    }
    name
}
