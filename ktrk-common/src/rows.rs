//! Row representation for tabular source data
//!
//! Every source adapter and both load paths speak the same shape: an
//! ordered list of (column, value) string pairs. Order matters (generic
//! tab snapshots and CSV output reproduce the source column order), so a
//! plain `HashMap` will not do. `Row` serializes as a JSON object with the
//! pairs in insertion order, which is the format the `generic_tab_rows`
//! table stores.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One tabular row: ordered (column, value) pairs, values as strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pairs: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// First value for `key`, exact match
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or "" when absent
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Set `key` to `value`, replacing an existing pair or appending
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True if any value contains `needle` (case-insensitive substring)
    pub fn matches(&self, needle: &str) -> bool {
        let q = needle.to_lowercase();
        self.pairs.iter().any(|(_, v)| v.to_lowercase().contains(&q))
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Row {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of column names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut row = Row::new();
        // Stored rows are always string-valued, but rows arriving from JSON
        // APIs may carry numbers, bools, or nulls; stringify those.
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            row.set(key, json_value_to_string(&value));
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Row, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// Flatten a JSON value to the string form rows store
pub fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut row = Row::new();
        row.set("Site ID", "S1");
        row.set("Value", "80");
        assert_eq!(row.get("Site ID"), Some("S1"));
        assert_eq!(row.get("Missing"), None);
        assert_eq!(row.get_or_empty("Missing"), "");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = Row::from([("a", "1"), ("b", "2")]);
        row.set("a", "9");
        assert_eq!(row.get("a"), Some("9"));
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let row = Row::from([("zulu", "1"), ("alpha", "2"), ("mike", "3")]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"zulu":"1","alpha":"2","mike":"3"}"#);
    }

    #[test]
    fn test_deserialize_stringifies_scalars() {
        let row: Row = serde_json::from_str(r#"{"n":5,"b":true,"x":null,"s":"ok"}"#).unwrap();
        assert_eq!(row.get("n"), Some("5"));
        assert_eq!(row.get("b"), Some("true"));
        assert_eq!(row.get("x"), Some(""));
        assert_eq!(row.get("s"), Some("ok"));
    }

    #[test]
    fn test_round_trip() {
        let row = Row::from([("Site ID", "S1"), ("Notes", "has, comma")]);
        let json = serde_json::to_string(&row).unwrap();
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let row = Row::from([("status", "Confirmed")]);
        assert!(row.matches("confirm"));
        assert!(!row.matches("rejected"));
    }
}
