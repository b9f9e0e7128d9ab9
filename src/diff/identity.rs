//! Identity keys and canonical forms for item documents.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Rebuild a value with every mapping's keys in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact JSON text of the canonical form. Equal for documents that only
/// differ in key order.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Deep equality that ignores mapping key order.
pub fn items_equal(a: &Value, b: &Value) -> bool {
    canonical_json(a) == canonical_json(b)
}

/// Hex SHA-256 of the canonical form.
pub fn content_hash(value: &Value) -> String {
    format!("{:x}", Sha256::digest(canonical_json(value).as_bytes()))
}

/// Identity of an item under `identity_key`.
///
/// Strings, numbers and booleans are used as-is. A missing, `null`, empty or
/// structured field falls back to the item's content hash.
pub fn identity_of(item: &Value, identity_key: &str) -> String {
    match item.get(identity_key) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::Bool(id)) => id.to_string(),
        _ => content_hash(item),
    }
}
