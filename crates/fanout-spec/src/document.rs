//! Decoding of manifest documents into JSON values that remembers every
//! repeated mapping key instead of letting the last entry win.

use std::cell::RefCell;
use std::fmt;

use serde::Deserializer;
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use crate::errors::ValidationIssue;

/// A mapping key that appeared more than once in the same mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    /// JSON pointer of the mapping holding the key.
    pub path: String,
    pub key: String,
}

impl DuplicateKey {
    /// Validation issue for this key. Keys repeated inside a list element
    /// are parameter collisions.
    pub fn to_issue(&self) -> ValidationIssue {
        let path = if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.clone()
        };
        let code = if self.path.contains("/list/elements/") {
            "duplicate_param"
        } else {
            "duplicate_key"
        };
        ValidationIssue::error(code, path, format!("key '{}' is repeated", self.key))
            .with_hint("keep a single entry per key")
    }
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "key '{}' is repeated at {}", self.key, path)
    }
}

/// Decode one document, keeping the first entry of every repeated key and
/// listing the repeats.
pub fn decode_document<'de, D>(deserializer: D) -> Result<(Value, Vec<DuplicateKey>), D::Error>
where
    D: Deserializer<'de>,
{
    let duplicates = RefCell::new(Vec::new());
    let value = TrackedValue {
        path: String::new(),
        duplicates: &duplicates,
    }
    .deserialize(deserializer)?;
    Ok((value, duplicates.into_inner()))
}

struct TrackedValue<'a> {
    path: String,
    duplicates: &'a RefCell<Vec<DuplicateKey>>,
}

impl<'a> TrackedValue<'a> {
    fn child(&self, segment: &str) -> TrackedValue<'a> {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        TrackedValue {
            path: format!("{}/{escaped}", self.path),
            duplicates: self.duplicates,
        }
    }
}

impl<'de> DeserializeSeed<'de> for TrackedValue<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for TrackedValue<'_> {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a manifest document")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Value, E> {
        Ok(Number::from_f64(value).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        DeserializeSeed::deserialize(self, deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(self.child(&items.len().to_string()))? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(self.child(&key))?;
            if object.contains_key(&key) {
                self.duplicates.borrow_mut().push(DuplicateKey {
                    path: self.path.clone(),
                    key,
                });
                continue;
            }
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(yaml: &str) -> (Value, Vec<DuplicateKey>) {
        decode_document(serde_yaml::Deserializer::from_str(yaml)).expect("decode")
    }

    #[test]
    fn decodes_like_a_json_value() {
        let (value, duplicates) = decode("a: 1\nb: [true, null, x]\nc: { d: 1.5 }\n");
        assert_eq!(
            value,
            serde_json::json!({ "a": 1, "b": [true, null, "x"], "c": { "d": 1.5 } })
        );
        assert!(duplicates.is_empty());
    }

    #[test]
    fn records_repeated_keys_with_their_mapping_path() {
        let (value, duplicates) =
            decode("spec:\n  items:\n    - { env: dev, env: prod }\n  spec: x\n");
        assert_eq!(
            duplicates,
            vec![DuplicateKey {
                path: "/spec/items/0".to_string(),
                key: "env".to_string(),
            }]
        );
        assert_eq!(value["spec"]["items"][0]["env"], "dev");
    }

    #[test]
    fn escapes_pointer_segments() {
        let (_, duplicates) = decode("labels:\n  a/b: { k: 1, k: 2 }\n");
        assert_eq!(duplicates[0].path, "/labels/a~1b");
    }

    #[test]
    fn issue_code_depends_on_location() {
        let element = DuplicateKey {
            path: "/spec/generators/0/list/elements/1".to_string(),
            key: "env".to_string(),
        };
        assert_eq!(element.to_issue().code, "duplicate_param");

        let root = DuplicateKey {
            path: String::new(),
            key: "kind".to_string(),
        };
        let issue = root.to_issue();
        assert_eq!(issue.code, "duplicate_key");
        assert_eq!(issue.path, "/");
    }
}
