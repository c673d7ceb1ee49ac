//! Raw household records.

use serde::{Deserialize, Serialize};

use crate::key::ImportKey;

/// A household as exported: nothing but import keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub head: ImportKey,
    pub spouse: Option<ImportKey>,
    /// Null entries are allowed and ignored.
    #[serde(default)]
    pub others: Vec<Option<ImportKey>>,
    /// Absent if the address is unknown.
    pub address: Option<ImportKey>,
}

impl Household {
    /// Creates a household with only a head.
    #[must_use]
    pub fn headed_by(head: impl Into<ImportKey>) -> Self {
        Self {
            head: head.into(),
            spouse: None,
            others: Vec::new(),
            address: None,
        }
    }

    /// Set the spouse.
    #[must_use]
    pub fn with_spouse(mut self, spouse: impl Into<ImportKey>) -> Self {
        self.spouse = Some(spouse.into());
        self
    }

    /// Append an other member.
    #[must_use]
    pub fn with_other(mut self, other: impl Into<ImportKey>) -> Self {
        self.others.push(Some(other.into()));
        self
    }

    /// Set the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<ImportKey>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Other-member keys with null entries skipped.
    pub fn other_keys(&self) -> impl Iterator<Item = &ImportKey> {
        self.others.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_others_are_skipped() {
        let h: Household =
            serde_json::from_str(r#"{"head":"M1","others":["M2",null,"M3"]}"#).unwrap();
        let keys: Vec<&str> = h.other_keys().map(ImportKey::as_str).collect();
        assert_eq!(keys, vec!["M2", "M3"]);
        assert!(h.spouse.is_none());
        assert!(h.address.is_none());
    }

    #[test]
    fn test_head_is_required() {
        assert!(serde_json::from_str::<Household>(r#"{"others":[]}"#).is_err());
    }
}
