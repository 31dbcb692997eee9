//! Shared test utilities for the trustgate workspace.
//!
//! Golden decision files are compared as JSON values after the fields that vary between
//! runs have been pinned to fixed placeholders.

use serde_json::{Number, Value};

/// Placeholder written over `timestamp` on simulation envelopes.
pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";

/// Normalize non-deterministic JSON fields for golden-file comparison.
///
/// Only the root object is touched: `processingTimeMs` becomes `0.0`, and `timestamp`
/// becomes [`TIMESTAMP_PLACEHOLDER`] when the root is a simulation envelope (has a
/// `simulation` key). Context values echoed inside the trace (`actual`, `expected`) may
/// legitimately carry keys with the same names and are left alone.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        if obj.contains_key("processingTimeMs") {
            let zero = Number::from_f64(0.0).map_or(Value::Null, Value::Number);
            obj.insert("processingTimeMs".to_string(), zero);
        }
        if obj.contains_key("simulation") && obj.contains_key("timestamp") {
            obj.insert(
                "timestamp".to_string(),
                Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
            );
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pins_timing_on_decisions() {
        let a = normalize_nondeterministic(json!({ "decision": "deny", "processingTimeMs": 0.731 }));
        let b = normalize_nondeterministic(json!({ "decision": "deny", "processingTimeMs": 0 }));
        assert_eq!(a, b);
        assert_eq!(a["processingTimeMs"], json!(0.0));
    }

    #[test]
    fn pins_timestamp_on_simulations_only() {
        let sim = normalize_nondeterministic(json!({
            "decision": "allow",
            "simulation": true,
            "timestamp": "2026-03-01T10:00:00Z"
        }));
        assert_eq!(sim["timestamp"], TIMESTAMP_PLACEHOLDER);

        let plain = normalize_nondeterministic(json!({ "timestamp": "2026-03-01T10:00:00Z" }));
        assert_eq!(plain["timestamp"], "2026-03-01T10:00:00Z");
    }

    #[test]
    fn nested_context_values_are_untouched() {
        let input = json!({
            "processingTimeMs": 1.5,
            "trace": [{
                "actual": { "processingTimeMs": 42, "timestamp": "t", "simulation": true }
            }]
        });
        let result = normalize_nondeterministic(input);
        assert_eq!(result["trace"][0]["actual"]["processingTimeMs"], 42);
        assert_eq!(result["trace"][0]["actual"]["timestamp"], "t");
    }
}
