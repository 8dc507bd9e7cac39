//! Deterministic byte serialization (C1). The single authoritative witness
//! for "same logical value ⇒ same bytes"; every hash, MAC, and signature in
//! the gateway is computed over the output of `canonical_bytes`.

use crate::value::Value;
use serde::Serialize;

/// Serializes any `Serialize` type through `serde_json::Value`, re-sorting
/// object keys and dropping insignificant whitespace, then returns the
/// compact UTF-8 bytes. `serde_json::to_vec` already omits whitespace;
/// re-keying through a `BTreeMap` is what guarantees ascending key order
/// regardless of struct field declaration order.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let json = serde_json::to_value(value).expect("canonical_bytes: value must serialize");
    let sorted = sort_keys(json);
    serde_json::to_vec(&sorted).expect("canonical_bytes: sorted value must serialize")
}

/// Same as [`canonical_bytes`] but takes our own [`Value`] type directly,
/// routing binary data through base64 per the wire rule.
pub fn canonical_bytes_of(value: &Value) -> Vec<u8> {
    let json: serde_json::Value = value.clone().into();
    serde_json::to_vec(&sort_keys(json)).expect("canonical_bytes_of: value must serialize")
}

fn sort_keys(v: serde_json::Value) -> serde_json::Value {
    match v {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(a) => {
            serde_json::Value::Array(a.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn idempotent_roundtrip() {
        let v = json!({"b": 1, "a": [3, 2, 1], "c": {"z": 1, "y": 2}});
        let once = canonical_bytes(&v);
        let parsed: serde_json::Value = serde_json::from_slice(&once).unwrap();
        let twice = canonical_bytes(&parsed);
        assert_eq!(once, twice);
    }

    #[test]
    fn keys_are_sorted() {
        let v = json!({"zeta": 1, "alpha": 2});
        let bytes = canonical_bytes(&v);
        let s = String::from_utf8(bytes).unwrap();
        assert_eq!(s, r#"{"alpha":2,"zeta":1}"#);
    }

    #[test]
    fn no_insignificant_whitespace() {
        let v = json!({"a": 1, "b": [1, 2]});
        let s = String::from_utf8(canonical_bytes(&v)).unwrap();
        assert!(!s.contains(' '));
    }
}
