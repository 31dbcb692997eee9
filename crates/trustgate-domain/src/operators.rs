//! Typed operator semantics over resolved JSON values.

use globset::{GlobBuilder, GlobMatcher};
use moka::sync::Cache;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::sync::LazyLock;
use trustgate_types::ids;

use crate::error::MalformedReason;
use crate::model::Operator;
use crate::trust::TrustLevel;

/// Result of applying one operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub result: bool,
    /// Trace note explaining a `false` that is not a plain mismatch.
    pub note: Option<&'static str>,
}

impl Comparison {
    fn of(result: bool) -> Self {
        Self { result, note: None }
    }

    fn incomparable() -> Self {
        Self {
            result: false,
            note: Some(ids::NOTE_INCOMPARABLE),
        }
    }
}

/// Apply `op` to a present field value.
///
/// Missing fields never reach this function; the evaluator reports them as
/// `fieldMissing` before any operator runs.
pub fn apply(
    op: Operator,
    actual: &JsonValue,
    expected: &JsonValue,
) -> Result<Comparison, MalformedReason> {
    let cmp = match op {
        Operator::Equals => Comparison::of(values_equal(actual, expected)),
        Operator::NotEquals => Comparison::of(!values_equal(actual, expected)),
        Operator::In => Comparison::of(member_of(actual, expected, op)?),
        Operator::NotIn => Comparison::of(!member_of(actual, expected, op)?),
        Operator::GreaterThan => ordered(actual, expected, Ordering::is_gt),
        Operator::GreaterThanOrEqual => ordered(actual, expected, Ordering::is_ge),
        Operator::LessThan => ordered(actual, expected, Ordering::is_lt),
        Operator::LessThanOrEqual => ordered(actual, expected, Ordering::is_le),
        Operator::Contains => match actual {
            JsonValue::String(haystack) => match expected {
                JsonValue::String(needle) => Comparison::of(haystack.contains(needle.as_str())),
                _ => Comparison::incomparable(),
            },
            JsonValue::Array(items) => {
                Comparison::of(items.iter().any(|item| values_equal(item, expected)))
            }
            _ => Comparison::incomparable(),
        },
        Operator::Matches => {
            let JsonValue::String(pattern) = expected else {
                return Err(MalformedReason::ValueType {
                    operator: op,
                    expected: "a glob pattern string",
                });
            };
            match actual {
                JsonValue::String(text) => Comparison::of(glob_match(pattern, text)?),
                _ => Comparison::incomparable(),
            }
        }
        Operator::Exists => Comparison::of(!actual.is_null()),
    };
    Ok(cmp)
}

/// JSON equality with numbers compared by value (`1 == 1.0`).
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (JsonValue::Array(xs), JsonValue::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (JsonValue::Object(xs), JsonValue::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering between two operands: numerically, or by trust-level rank when both are
/// trust-level names. Anything else is incomparable.
pub fn compare(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (JsonValue::String(x), JsonValue::String(y)) => {
            let x = x.parse::<TrustLevel>().ok()?;
            let y = y.parse::<TrustLevel>().ok()?;
            Some(x.cmp(&y))
        }
        _ => None,
    }
}

fn ordered(actual: &JsonValue, expected: &JsonValue, accept: fn(Ordering) -> bool) -> Comparison {
    match compare(actual, expected) {
        Some(ord) => Comparison::of(accept(ord)),
        None => Comparison::incomparable(),
    }
}

fn member_of(
    actual: &JsonValue,
    expected: &JsonValue,
    op: Operator,
) -> Result<bool, MalformedReason> {
    match expected {
        JsonValue::Array(items) => Ok(items.iter().any(|item| values_equal(actual, item))),
        _ => Err(MalformedReason::ValueType {
            operator: op,
            expected: "an array value",
        }),
    }
}

/// Distinct `matches` patterns kept compiled across evaluations.
const GLOB_CACHE_CAPACITY: u64 = 1_024;

static GLOBS: LazyLock<Cache<String, GlobMatcher>> =
    LazyLock::new(|| Cache::new(GLOB_CACHE_CAPACITY));

/// Compiled matcher for a `matches` pattern. Validation and evaluation share the
/// same compiled instance; invalid patterns are not remembered.
pub(crate) fn compiled_glob(pattern: &str) -> Result<GlobMatcher, MalformedReason> {
    if let Some(matcher) = GLOBS.get(pattern) {
        return Ok(matcher);
    }
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(false)
        .case_insensitive(false)
        .build()
        .map_err(|e| MalformedReason::InvalidPattern(e.to_string()))?
        .compile_matcher();
    GLOBS.insert(pattern.to_string(), matcher.clone());
    Ok(matcher)
}

fn glob_match(pattern: &str, text: &str) -> Result<bool, MalformedReason> {
    Ok(compiled_glob(pattern)?.is_match(text))
}
