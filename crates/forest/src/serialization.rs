//! Canonical JSON serialization helpers.
//!
//! Serializes structures with recursively sorted object keys and compact
//! formatting so that model artifacts hash identically across runs and
//! platforms.

use serde::Serialize;
use serde_json::{map::Map, Value};

/// Recursively sort JSON object keys to obtain a canonical representation.
///
/// Without serde_json's `preserve_order` feature `Map` is already sorted and
/// this is a no-op. Any crate in the dependency graph can switch that feature
/// on through feature unification, and then insertion order would leak into
/// the model hash.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key, canonicalize(val));
            }

            Value::Object(sorted)
        }
        Value::Array(elements) => Value::Array(elements.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serialize a value into compact canonical JSON.
pub fn to_canonical_json<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize,
{
    let canonical_value = canonicalize(serde_json::to_value(value)?);
    serde_json::to_string(&canonical_value)
}

/// BLAKE3 hash (hex) of the canonical JSON form of `value`.
pub fn hash_canonical_hex<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize,
{
    let json = to_canonical_json(value)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
