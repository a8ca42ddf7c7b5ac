//! Ordered field/value records produced by extractors.

use std::ops::Index;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

/// One parsed row or block of device output.
///
/// Fields keep the order in which the device printed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value under the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Integer field, if present and numeric.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Text field, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// True if the field is present and null.
    pub fn is_null(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_null)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Index<&str> for Record {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(key).unwrap_or(&NULL)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_access() {
        let mut record = Record::new();
        record.insert("Slot", Value::Int(4));
        record.insert("PhyId", Value::Text("FHTT033178b0".into()));
        record.insert("PhyPwd", Value::Null);

        assert_eq!(record.keys().collect::<Vec<_>>(), ["Slot", "PhyId", "PhyPwd"]);
        assert_eq!(record.int("Slot"), Some(4));
        assert_eq!(record.text("PhyId"), Some("FHTT033178b0"));
        assert!(record.is_null("PhyPwd"));
        assert_eq!(record["missing"], Value::Null);
    }

    #[test]
    fn test_serialize_as_map() {
        let record: Record = [("a", Value::Int(1)), ("b", Value::Null)].into_iter().collect();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"a":1,"b":null}"#);
    }
}
