//! Postal and contact address.

use serde::{Deserialize, Serialize};

/// An address as exported and as embedded in stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line.
    pub address: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub e_mail: Option<String>,
    pub home_phone: Option<String>,
}

impl Address {
    /// Creates an address with only the required fields.
    #[must_use]
    pub fn new(address: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            city: city.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let json = r#"{"address":"1 Main St","city":"Springfield","postalCode":"12345","eMail":"a@b.c","homePhone":""}"#;
        let a: Address = serde_json::from_str(json).unwrap();
        assert_eq!(a.postal_code.as_deref(), Some("12345"));
        assert_eq!(a.e_mail.as_deref(), Some("a@b.c"));
        assert_eq!(a.home_phone.as_deref(), Some(""));
        assert!(a.address2.is_none());
    }

    #[test]
    fn test_street_and_city_are_required() {
        assert!(serde_json::from_str::<Address>(r#"{"city":"X"}"#).is_err());
        assert!(serde_json::from_str::<Address>(r#"{"address":"X"}"#).is_err());
    }
}
