use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured value used throughout the gateway wherever the original
/// system carried an untyped dictionary (activity data, metadata, encrypted
/// field maps). Replaces "any-shaped" maps with a closed tagged variant.
///
/// `Map` uses a `BTreeMap` rather than a hash map so that iteration order is
/// always key-sorted — the precondition the canonical encoder relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    // Kept last: untagged deserialization tries variants in order, and a
    // JSON array of numbers must resolve to `List`, not `Bytes`. `Bytes` is
    // never produced by `From<serde_json::Value>` below — it only ever
    // originates in-process (e.g. a ciphertext before base64 encoding).
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn map(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Map(entries.into_iter().collect())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Converts a `serde_json::Value` (the shape every JSON request body parses
/// to) into our closed `Value` type. JSON never carries raw bytes, so the
/// `Bytes` variant is never produced here — it is only ever constructed
/// in-process (e.g. by the key vault before base64-encoding a ciphertext).
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Map(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Converts back to `serde_json::Value`, used by the canonical encoder and
/// by anything handing a `Value` back out over the HTTP surface. `Bytes` is
/// represented as a base64 string, matching the wire rule that binary data
/// is base64-encoded wherever it appears in canonical output.
impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        use base64::Engine as _;
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(
                base64::engine::general_purpose::STANDARD.encode(b),
            ),
            Value::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            Value::Map(m) => serde_json::Value::Object(
                m.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}
