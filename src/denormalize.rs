//! Denormalizer: resolve household references into embedded documents.
//!
//! Input is the three indexes; output is one [`HouseholdDocument`] per raw
//! household, in input order, followed by the placeholder household that
//! collects members with no household of their own.
//!
//! Missing head, spouse or household address keys abort the run. A missing
//! "other" member, temporary address or parent is a [`SoftError`]: it is
//! logged, the field is left out and the run continues.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::context::RunContext;
use crate::error::{CollectionKind, DataError, ReferenceKind};
use crate::index::Index;
use crate::key::{ImportKey, RecordKey, StoreKey};
use crate::model::{Address, Household, HouseholdDocument, Member, PersonDocument};

/// A reference that could not be resolved but did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftError {
    /// Field the reference was found in.
    pub kind: ReferenceKind,
    /// Household (for `Other`) or member (for the rest) holding the reference.
    pub owner: ImportKey,
    /// The key that did not resolve.
    pub missing: ImportKey,
}

impl fmt::Display for SoftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no record imported for {} '{}' of '{}'",
            self.kind, self.missing, self.owner
        )
    }
}

/// Output of [`denormalize`].
#[derive(Debug, Clone)]
pub struct Denormalized {
    /// Household documents, placeholder household last.
    pub documents: Vec<HouseholdDocument>,
    /// Unresolved optional references.
    pub soft_errors: Vec<SoftError>,
}

impl Denormalized {
    /// The placeholder household.
    #[must_use]
    pub fn placeholder(&self) -> Option<&HouseholdDocument> {
        self.documents.last()
    }
}

/// Resolve every household into a self-contained document.
///
/// # Errors
/// - `DanglingReference` for an unresolved head, spouse or address
/// - `DuplicateImportKey` if an input household uses the placeholder key
pub fn denormalize(
    ctx: &RunContext,
    households: &Index<Household>,
    members: &Index<Member>,
    addresses: &Index<Address>,
) -> Result<Denormalized, DataError> {
    if households.contains(ctx.placeholder_key()) {
        return Err(DataError::DuplicateImportKey {
            collection: CollectionKind::Households,
            key: ctx.placeholder_key().clone(),
        });
    }

    let mut soft_errors = Vec::new();
    let people = embed_members(ctx, members, addresses, &mut soft_errors);

    let mut claimed: HashSet<&ImportKey> = HashSet::new();
    let mut documents = Vec::with_capacity(households.len() + 1);

    for (n, (key, household)) in households.iter().enumerate() {
        let head = people.get(&household.head).ok_or_else(|| DataError::DanglingReference {
            kind: ReferenceKind::Head,
            household: key.clone(),
            missing: household.head.clone(),
        })?;
        claimed.insert(&household.head);

        let spouse = match &household.spouse {
            Some(spouse_key) => {
                let spouse = people.get(spouse_key).ok_or_else(|| DataError::DanglingReference {
                    kind: ReferenceKind::Spouse,
                    household: key.clone(),
                    missing: spouse_key.clone(),
                })?;
                claimed.insert(spouse_key);
                Some(spouse.clone())
            }
            None => None,
        };

        let mut others = Vec::new();
        for other_key in household.other_keys() {
            if let Some(other) = people.get(other_key) {
                claimed.insert(other_key);
                others.push(other.clone());
            } else {
                error!(household = %key, missing = %other_key, "no member imported for other member of household");
                soft_errors.push(SoftError {
                    kind: ReferenceKind::Other,
                    owner: key.clone(),
                    missing: other_key.clone(),
                });
            }
        }

        let address = match &household.address {
            Some(address_key) => Some(
                addresses
                    .get(address_key)
                    .cloned()
                    .ok_or_else(|| DataError::DanglingReference {
                        kind: ReferenceKind::Address,
                        household: key.clone(),
                        missing: address_key.clone(),
                    })?,
            ),
            None => None,
        };

        if ctx.should_log(n) {
            info!(household = %key, "household of {}", head.full_name());
        }
        documents.push(HouseholdDocument {
            id: RecordKey::Import(key.clone()),
            head: head.clone(),
            spouse,
            others,
            address,
        });
    }

    let mut placeholder = HouseholdDocument {
        id: RecordKey::Import(ctx.placeholder_key().clone()),
        head: ctx.placeholder_head().clone(),
        spouse: None,
        others: Vec::new(),
        address: None,
    };
    for (key, member) in members.iter() {
        if claimed.contains(key) {
            continue;
        }
        if let Some(own) = &member.household {
            if !households.contains(own) {
                warn!(
                    member = %key,
                    household = %own,
                    "{} belongs to a household that was not imported; member left out of the load",
                    member.full_name()
                );
            }
            continue;
        }
        if let Some(person) = people.get(key) {
            debug!(member = %key, "placing {} in placeholder household", person.full_name());
            placeholder.others.push(person.clone());
        }
    }
    info!(
        households = documents.len(),
        placeholder_members = placeholder.others.len(),
        soft_errors = soft_errors.len(),
        "denormalized"
    );
    documents.push(placeholder);

    Ok(Denormalized {
        documents,
        soft_errors,
    })
}

/// Convert every member to its embedded form.
///
/// Parent links need every member's run key, so keys are minted first.
fn embed_members<'a>(
    ctx: &RunContext,
    members: &'a Index<Member>,
    addresses: &Index<Address>,
    soft_errors: &mut Vec<SoftError>,
) -> HashMap<&'a ImportKey, PersonDocument> {
    let run_keys: HashMap<&ImportKey, StoreKey> = members
        .iter()
        .map(|(key, _)| (key, StoreKey::generate()))
        .collect();

    let mut people = HashMap::with_capacity(members.len());
    for (n, (key, member)) in members.iter().enumerate() {
        let Some(id) = run_keys.get(key).cloned() else {
            continue;
        };
        let person = embed_member(ctx, key, member, id, &run_keys, addresses, soft_errors);
        if ctx.should_log(n) {
            info!(member = %key, "member {}", person.full_name());
        }
        people.insert(key, person);
    }
    people
}

fn resolve_parent(
    kind: ReferenceKind,
    owner: &ImportKey,
    parent: Option<&ImportKey>,
    run_keys: &HashMap<&ImportKey, StoreKey>,
    soft_errors: &mut Vec<SoftError>,
) -> Option<StoreKey> {
    let parent = parent?;
    let resolved = run_keys.get(parent).cloned();
    if resolved.is_none() {
        error!(member = %owner, missing = %parent, "no member imported for {kind}");
        soft_errors.push(SoftError {
            kind,
            owner: owner.clone(),
            missing: parent.clone(),
        });
    }
    resolved
}

fn embed_member(
    ctx: &RunContext,
    key: &ImportKey,
    member: &Member,
    id: StoreKey,
    run_keys: &HashMap<&ImportKey, StoreKey>,
    addresses: &Index<Address>,
    soft_errors: &mut Vec<SoftError>,
) -> PersonDocument {
    let household = member
        .household
        .clone()
        .unwrap_or_else(|| ctx.placeholder_key().clone());

    let temp_address = member.temp_address.as_ref().and_then(|ta| {
        let found = addresses.get(ta).cloned();
        match &found {
            Some(a) => debug!(member = %key, "temp address {}, {}", a.address, a.city),
            None => {
                error!(member = %key, missing = %ta, "no address imported for temp address");
                soft_errors.push(SoftError {
                    kind: ReferenceKind::TempAddress,
                    owner: key.clone(),
                    missing: ta.clone(),
                });
            }
        }
        found
    });

    let father = resolve_parent(ReferenceKind::Father, key, member.father.as_ref(), run_keys, soft_errors);
    let mother = resolve_parent(ReferenceKind::Mother, key, member.mother.as_ref(), run_keys, soft_errors);

    let back_ref = id.to_string();
    let transactions = member
        .transactions
        .iter()
        .cloned()
        .map(|mut t| {
            t.index.clone_from(&back_ref);
            t
        })
        .collect();
    let services = member
        .services
        .iter()
        .cloned()
        .map(|mut s| {
            s.index.clone_from(&back_ref);
            s
        })
        .collect();

    PersonDocument {
        id,
        family_name: member.family_name.clone(),
        given_name: member.given_name.clone(),
        middle_name: member.middle_name.clone(),
        previous_family_name: member.previous_family_name.clone(),
        name_suffix: member.name_suffix.clone(),
        title: member.title.clone(),
        nick_name: member.nick_name.clone(),
        sex: member.sex,
        date_of_birth: member.date_of_birth,
        place_of_birth: member.place_of_birth.clone(),
        status: member.status,
        resident: member.resident,
        ex_directory: member.ex_directory,
        household: RecordKey::Import(household),
        temp_address,
        transactions,
        marital_status: member.marital_status,
        spouse: member.spouse.clone(),
        date_of_marriage: member.date_of_marriage,
        divorce: member.divorce.clone(),
        father,
        mother,
        e_mail: member.e_mail.clone(),
        work_e_mail: member.work_e_mail.clone(),
        mobile_phone: member.mobile_phone.clone(),
        work_phone: member.work_phone.clone(),
        education: member.education.clone(),
        employer: member.employer.clone(),
        baptism: member.baptism.clone(),
        services,
        date_last_changed: member.date_last_changed,
    }
}
