//! `yyyy-MM-dd` date codec.
//!
//! Dates in the export are plain calendar dates with no time zone. They are
//! written back in the same form.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format of every date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `yyyy-MM-dd` date.
pub fn parse(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
}

/// Serde adapter for `Option<NaiveDate>`; use with
/// `#[serde(default, with = "crate::model::date::optional")]`.
pub mod optional {
    use super::{parse, Deserialize, Deserializer, NaiveDate, Serializer, DATE_FORMAT};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            parse(&s).map_err(|e| {
                serde::de::Error::custom(format!("invalid date '{s}', expected yyyy-MM-dd: {e}"))
            })
        })
        .transpose()
    }
}
