//! PHP `serialize()` payloads.
//!
//! Carts captured by older plugin versions keep `location`, `cart_contents`
//! and `other_fields` in PHP's native serialization format, e.g.
//!
//! ```text
//! a:2:{s:7:"country";s:2:"LV";s:4:"city";s:4:"Riga";}
//! ```
//!
//! Payloads are decoded into [`serde_json::Value`], so both stored encodings
//! go through the same serde types. PHP arrays with the keys `0..n` in order
//! become JSON arrays, any other array or object becomes a JSON object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

const MAX_DEPTH: usize = 64;

static SCALAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[bid]:[0-9.E+-]+;$").expect("valid scalar regex"));
static COMPOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[aOE]:[0-9]+:").expect("valid compound regex"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnserializeError {
    #[error("expected `{0}`")]
    Expected(&'static str),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("string length {0} out of bounds")]
    InvalidLength(usize),

    #[error("array keys must be integers or strings")]
    InvalidKey,

    #[error("unsupported type `{0}`")]
    UnsupportedType(char),

    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,

    #[error("trailing data after value")]
    TrailingData,
}

/// Returns true when `data` looks like a PHP-serialized value.
///
/// This is a shape check only, the payload may still fail to decode.
pub fn is_serialized(data: &str) -> bool {
    let data = data.trim();

    if data == "N;" {
        return true;
    }

    let bytes = data.as_bytes();
    if bytes.len() < 4 || bytes[1] != b':' {
        return false;
    }

    if !data.ends_with(';') && !data.ends_with('}') {
        return false;
    }

    match bytes[0] {
        b's' => data.ends_with("\";"),
        b'a' | b'O' | b'E' => COMPOUND.is_match(data),
        b'b' | b'i' | b'd' => SCALAR.is_match(data),
        _ => false,
    }
}

/// Decodes a PHP-serialized value.
pub fn unserialize(data: &str) -> Result<Value, UnserializeError> {
    let mut reader = Reader { rest: data.trim() };
    let value = reader.value(0)?;

    if !reader.rest.is_empty() {
        return Err(UnserializeError::TrailingData);
    }

    Ok(value)
}

/// Decodes a stored blob, PHP-serialized or JSON.
///
/// Returns `None` when the blob is in neither encoding.
pub fn decode_blob(data: &str) -> Option<Value> {
    if is_serialized(data) {
        return unserialize(data).ok();
    }

    serde_json::from_str(data).ok()
}

struct Reader<'a> {
    rest: &'a str,
}

impl<'a> Reader<'a> {
    fn tag(&mut self, tag: &'static str) -> Result<(), UnserializeError> {
        self.rest = self
            .rest
            .strip_prefix(tag)
            .ok_or(UnserializeError::Expected(tag))?;

        Ok(())
    }

    fn until(&mut self, end: char, expected: &'static str) -> Result<&'a str, UnserializeError> {
        let (token, rest) = self
            .rest
            .split_once(end)
            .ok_or(UnserializeError::Expected(expected))?;
        self.rest = rest;

        Ok(token)
    }

    // Lengths count bytes, not characters.
    fn take(&mut self, len: usize) -> Result<&'a str, UnserializeError> {
        let token = self
            .rest
            .get(..len)
            .ok_or(UnserializeError::InvalidLength(len))?;
        self.rest = &self.rest[len..];

        Ok(token)
    }

    fn number<T: std::str::FromStr>(
        &mut self,
        end: char,
        expected: &'static str,
    ) -> Result<T, UnserializeError> {
        let token = self.until(end, expected)?;

        token
            .parse()
            .map_err(|_| UnserializeError::InvalidNumber(token.to_owned()))
    }

    fn string(&mut self) -> Result<&'a str, UnserializeError> {
        let len = self.number::<usize>(':', ":")?;
        self.tag("\"")?;
        let value = self.take(len)?;
        self.tag("\"")?;

        Ok(value)
    }

    fn value(&mut self, depth: usize) -> Result<Value, UnserializeError> {
        if depth > MAX_DEPTH {
            return Err(UnserializeError::TooDeep);
        }

        let kind = self
            .rest
            .chars()
            .next()
            .ok_or(UnserializeError::Expected("value"))?;

        match kind {
            'N' => {
                self.tag("N;")?;
                Ok(Value::Null)
            }
            'b' => {
                self.tag("b:")?;
                Ok(Value::Bool(self.number::<i64>(';', ";")? != 0))
            }
            'i' => {
                self.tag("i:")?;
                Ok(Value::from(self.number::<i64>(';', ";")?))
            }
            'd' => {
                self.tag("d:")?;
                let value = self.number::<f64>(';', ";")?;

                Ok(Number::from_f64(value).map_or(Value::Null, Value::Number))
            }
            's' => {
                self.tag("s:")?;
                let value = self.string()?;
                self.tag(";")?;

                Ok(Value::String(value.to_owned()))
            }
            'a' => {
                self.tag("a:")?;
                self.entries(depth)
            }
            'O' => {
                self.tag("O:")?;
                self.string()?;
                self.tag(":")?;

                match self.entries(depth)? {
                    Value::Array(items) => Ok(Value::Object(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(index, item)| (index.to_string(), item))
                            .collect(),
                    )),
                    object => Ok(object),
                }
            }
            kind => Err(UnserializeError::UnsupportedType(kind)),
        }
    }

    fn entries(&mut self, depth: usize) -> Result<Value, UnserializeError> {
        let count = self.number::<usize>(':', ":")?;
        self.tag("{")?;

        let mut entries = Vec::new();
        for _ in 0..count {
            let key = match self.value(depth + 1)? {
                Value::Number(key) if key.is_i64() => key.to_string(),
                Value::String(key) => key,
                _ => return Err(UnserializeError::InvalidKey),
            };

            entries.push((key, self.value(depth + 1)?));
        }

        self.tag("}")?;

        let is_list = entries
            .iter()
            .enumerate()
            .all(|(index, (key, _))| *key == index.to_string());

        if is_list {
            return Ok(Value::Array(
                entries.into_iter().map(|(_, value)| value).collect(),
            ));
        }

        Ok(Value::Object(entries.into_iter().collect::<Map<_, _>>()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_is_serialized() {
        assert!(is_serialized("N;"));
        assert!(is_serialized("b:1;"));
        assert!(is_serialized("i:42;"));
        assert!(is_serialized("d:1.5;"));
        assert!(is_serialized(r#"s:4:"Riga";"#));
        assert!(is_serialized(r#" a:1:{s:4:"city";s:4:"Riga";} "#));
        assert!(is_serialized(r#"O:8:"stdClass":0:{}"#));

        assert!(!is_serialized(""));
        assert!(!is_serialized("LV, Riga"));
        assert!(!is_serialized(r#"{"country":"LV"}"#));
        assert!(!is_serialized("i:4x;"));
        assert!(!is_serialized("a:x:{}"));
    }

    #[test]
    fn test_unserialize_location() -> anyhow::Result<()> {
        let value = unserialize(
            r#"a:3:{s:7:"country";s:2:"LV";s:4:"city";s:4:"Riga";s:8:"postcode";s:7:"LV-1010";}"#,
        )?;

        assert_eq!(
            value,
            json!({"country": "LV", "city": "Riga", "postcode": "LV-1010"})
        );

        Ok(())
    }

    #[test]
    fn test_unserialize_list_of_items() -> anyhow::Result<()> {
        let value = unserialize(concat!(
            r#"a:2:{i:0;a:3:{s:10:"product_id";i:12;s:13:"product_title";s:3:"Mug";s:8:"quantity";i:2;}"#,
            r#"i:1;a:2:{s:5:"price";d:9.5;s:4:"gift";b:0;}}"#,
        ))?;

        assert_eq!(
            value,
            json!([
                {"product_id": 12, "product_title": "Mug", "quantity": 2},
                {"price": 9.5, "gift": false}
            ])
        );

        Ok(())
    }

    #[test]
    fn test_unserialize_counts_bytes() -> anyhow::Result<()> {
        assert_eq!(unserialize(r#"s:5:"Rīga";"#)?, json!("Rīga"));
        assert_eq!(
            unserialize(r#"s:4:"Rīga";"#),
            Err(UnserializeError::Expected("\""))
        );

        Ok(())
    }

    #[test]
    fn test_unserialize_sparse_array_and_object() -> anyhow::Result<()> {
        assert_eq!(
            unserialize(r#"a:2:{i:1;s:1:"a";i:0;s:1:"b";}"#)?,
            json!({"1": "a", "0": "b"})
        );
        assert_eq!(
            unserialize(r#"O:8:"stdClass":1:{s:4:"city";N;}"#)?,
            json!({"city": null})
        );

        Ok(())
    }

    #[test]
    fn test_unserialize_rejects_broken_payloads() {
        assert_eq!(
            unserialize(r#"a:1:{i:0;}"#),
            Err(UnserializeError::UnsupportedType('}'))
        );
        assert_eq!(
            unserialize(r#"s:10:"short";"#),
            Err(UnserializeError::InvalidLength(10))
        );
        assert_eq!(unserialize("i:1;i:2;"), Err(UnserializeError::TrailingData));
        assert_eq!(
            unserialize(r#"a:1:{d:1.5;i:1;}"#),
            Err(UnserializeError::InvalidKey)
        );
        assert_eq!(
            unserialize(&"a:1:{i:0;".repeat(100)),
            Err(UnserializeError::TooDeep)
        );
    }

    #[test]
    fn test_decode_blob() {
        assert_eq!(decode_blob(r#"a:1:{s:1:"a";i:1;}"#), Some(json!({"a": 1})));
        assert_eq!(decode_blob(r#"{"a":1}"#), Some(json!({"a": 1})));
        assert_eq!(decode_blob("LV, Riga"), None);
    }
}
