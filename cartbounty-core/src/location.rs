//! Customer location decoding.
//!
//! Carts store the location in one of two encodings:
//!
//! - a structured map with `country`, `city` and `postcode` keys, PHP-serialized
//!   (`a:3:{s:7:"country";s:2:"LV";...}`) or JSON
//! - the legacy flat string `"LV, Riga"`, with the postcode kept in the
//!   `other_fields` map under [`LEGACY_POSTCODE_FIELD`]
//!
//! Both are still found in the cart table, so [`Location::decode`] checks
//! which one it was given before decoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serialized::{decode_blob, is_serialized, unserialize};

/// Key of the billing postcode inside the legacy `other_fields` map.
pub const LEGACY_POSTCODE_FIELD: &str = "cartbounty_billing_postcode";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
}

impl Location {
    /// Decodes a `location` column value together with its `other_fields`.
    pub fn decode(location: &str, other_fields: Option<&str>) -> Self {
        if let Some(location) = Self::decode_structured(location) {
            return location;
        }

        let (country, city) = match location.split_once(',') {
            Some((country, rest)) => {
                let city = rest.split(',').next().unwrap_or_default();
                (country.to_owned(), city.trim().to_owned())
            }
            None => (location.to_owned(), String::new()),
        };

        Self {
            country,
            city,
            postcode: other_fields.and_then(legacy_postcode).unwrap_or_default(),
        }
    }

    fn decode_structured(location: &str) -> Option<Self> {
        // A serialized value never falls back to the flat string.
        if is_serialized(location) {
            return Some(match unserialize(location) {
                Ok(Value::Object(fields)) => Self::from_fields(&fields),
                _ => Self::default(),
            });
        }

        if !location.trim_start().starts_with('{') {
            return None;
        }

        match serde_json::from_str::<Value>(location).ok()? {
            Value::Object(fields) => Some(Self::from_fields(&fields)),
            _ => None,
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let field = |name: &str| fields.get(name).and_then(scalar).unwrap_or_default();

        Self {
            country: field("country"),
            city: field("city"),
            postcode: field("postcode"),
        }
    }

    /// Encodes the location in the structured format.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_empty() && self.city.is_empty() && self.postcode.is_empty()
    }
}

fn legacy_postcode(other_fields: &str) -> Option<String> {
    match decode_blob(other_fields)? {
        Value::Object(fields) => fields.get(LEGACY_POSTCODE_FIELD).and_then(scalar),
        _ => None,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.to_owned()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.country)?;

        for part in [&self.city, &self.postcode] {
            if !part.is_empty() {
                write!(f, ", {part}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_structured() {
        let location = Location::decode(
            r#"{"country":"LV","city":"Riga","postcode":"LV-1010"}"#,
            None,
        );

        assert_eq!(location.country, "LV");
        assert_eq!(location.city, "Riga");
        assert_eq!(location.postcode, "LV-1010");
        assert_eq!(location.to_string(), "LV, Riga, LV-1010");
    }

    #[test]
    fn test_decode_legacy() {
        let location = Location::decode(
            "LV,  Riga ",
            Some(r#"{"cartbounty_billing_postcode":"LV-1010","cartbounty_billing_company":"Acme"}"#),
        );

        assert_eq!(
            location,
            Location {
                country: "LV".to_owned(),
                city: "Riga".to_owned(),
                postcode: "LV-1010".to_owned(),
            }
        );
    }

    #[test]
    fn test_decode_serialized() {
        let location = Location::decode(
            r#"a:3:{s:7:"country";s:2:"LV";s:4:"city";s:4:"Riga";s:8:"postcode";s:7:"LV-1010";}"#,
            None,
        );

        assert_eq!(location.to_string(), "LV, Riga, LV-1010");

        let location = Location::decode(
            r#"a:2:{s:7:"country";s:2:"EE";s:8:"postcode";i:10115;}"#,
            None,
        );

        assert_eq!(location.country, "EE");
        assert_eq!(location.city, "");
        assert_eq!(location.postcode, "10115");
    }

    #[test]
    fn test_decode_broken_serialized_location() {
        let location = Location::decode(r#"a:1:{s:7:"country";s:9:"LV";}"#, None);

        assert!(location.is_empty());
    }

    #[test]
    fn test_decode_legacy_with_serialized_other_fields() {
        let location = Location::decode(
            "LV, Riga",
            Some(r#"a:2:{s:27:"cartbounty_billing_postcode";s:7:"LV-1010";s:26:"cartbounty_billing_company";s:4:"Acme";}"#),
        );

        assert_eq!(location.to_string(), "LV, Riga, LV-1010");
    }

    #[test]
    fn test_decode_legacy_without_city() {
        let location = Location::decode("LV", Some("not a map"));

        assert_eq!(location.country, "LV");
        assert_eq!(location.city, "");
        assert_eq!(location.postcode, "");
        assert_eq!(location.to_string(), "LV");
    }

    #[test]
    fn test_decode_broken_map_falls_back_to_flat_string() {
        let location = Location::decode("{broken", None);

        assert_eq!(location.country, "{broken");
        assert!(!location.is_empty());
        assert!(Location::decode("", None).is_empty());
    }

    #[test]
    fn test_encode_roundtrip() -> anyhow::Result<()> {
        let location = Location {
            country: "EE".to_owned(),
            city: "Tallinn".to_owned(),
            postcode: String::new(),
        };

        assert_eq!(Location::decode(&location.encode()?, None), location);

        Ok(())
    }
}
