// Write payload values
//
// A write is a set of top-level fields. Values may contain the
// `ServerTimestamp` marker anywhere; the store replaces every marker in a
// write with the same RFC 3339 timestamp.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level fields of a write
pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain JSON value, stored as is
    Value(Value),
    /// Replaced by the store's write time
    ServerTimestamp,
    Map(Fields),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Substitute `now` for every timestamp marker
    pub fn resolve(self, now: &str) -> Value {
        match self {
            FieldValue::Value(value) => value,
            FieldValue::ServerTimestamp => Value::String(now.to_string()),
            FieldValue::Map(fields) => Value::Object(resolve_fields(fields, now)),
            FieldValue::Array(items) => {
                Value::Array(items.into_iter().map(|item| item.resolve(now)).collect())
            }
        }
    }
}

pub(crate) fn resolve_fields(fields: Fields, now: &str) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, value.resolve(now)))
        .collect()
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Value(Value::Bool(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Value(Value::from(value))
    }
}

impl From<Fields> for FieldValue {
    fn from(fields: Fields) -> Self {
        FieldValue::Map(fields)
    }
}
