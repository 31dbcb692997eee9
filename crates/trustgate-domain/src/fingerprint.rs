use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

/// Serialize `value` to JSON with object keys sorted at every level.
///
/// Used for structural identity (sibling deduplication) and for cache-key hashing,
/// so output must not depend on map iteration order.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(v) => {
            let mut out = String::new();
            write_canonical(&v, &mut out);
            out
        }
        // Serializing our own DTOs cannot fail; keep a stable sentinel if it ever does.
        Err(_) => String::from("null"),
    }
}

/// Compute a stable SHA-256 hex fingerprint of a value's canonical JSON.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> String {
    let canonical = canonical_json(value);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

fn write_canonical(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&JsonValue::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
