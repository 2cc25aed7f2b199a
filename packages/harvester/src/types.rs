//! Core data types for the harvester.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical nested value of a normalized document.
///
/// Serializes without tags: a scalar becomes a string, a mapping an
/// object and a sequence an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    /// Text of a leaf element.
    Scalar(String),
    /// Child elements keyed by local name, in order of first occurrence.
    Mapping(IndexMap<String, NormalizedValue>),
    /// Values of same-named siblings in document order.
    Sequence(Vec<NormalizedValue>),
}

impl NormalizedValue {
    /// Scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Mapping entries, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, NormalizedValue>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Sequence items, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[NormalizedValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a mapping key.
    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

impl From<&str> for NormalizedValue {
    fn from(text: &str) -> Self {
        Self::Scalar(text.to_string())
    }
}

impl From<String> for NormalizedValue {
    fn from(text: String) -> Self {
        Self::Scalar(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedValue {
        NormalizedValue::Mapping(IndexMap::from([
            (
                "item".to_string(),
                NormalizedValue::Sequence(vec!["A".into(), "B".into()]),
            ),
            ("name".to_string(), "X".into()),
        ]))
    }

    #[test]
    fn test_accessors() {
        let value = sample();
        assert_eq!(value.get("name").and_then(NormalizedValue::as_str), Some("X"));
        assert_eq!(
            value.get("item").and_then(NormalizedValue::as_sequence).map(<[_]>::len),
            Some(2)
        );
        assert!(value.get("missing").is_none());
        assert!(value.as_str().is_none());
    }

    #[test]
    fn test_serializes_untagged() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"item":["A","B"],"name":"X"}"#);
    }

    #[test]
    fn test_mapping_serializes_in_insertion_order() {
        let value = NormalizedValue::Mapping(IndexMap::from([
            ("zeta".to_string(), "1".into()),
            ("alpha".to_string(), "2".into()),
        ]));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"zeta":"1","alpha":"2"}"#
        );
    }

    #[test]
    fn test_deserializes_plain_json() {
        let value: NormalizedValue = serde_json::from_str(r#"{"item":["A","B"],"name":"X"}"#).unwrap();
        assert_eq!(value, sample());
    }
}
