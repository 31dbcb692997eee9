use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical dot-path naming a field of the evaluation context.
///
/// Normalization rules are intentionally simple and deterministic:
/// - segments are separated by `.`
/// - whitespace around segments is trimmed
/// - empty segments are dropped (`subject..role` == `subject.role`)
///
/// The first segment names the context root (`subject`, `resource`, `action`,
/// `environment`, `organizationId`); numeric segments index into arrays.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let joined = s
            .as_ref()
            .split('.')
            .map(str::trim)
            .filter(|seg| !seg.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|seg| !seg.is_empty())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_and_empty_segments() {
        let path = FieldPath::new(" subject . .trustLevel ");
        assert_eq!(path.as_str(), "subject.trustLevel");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["subject", "trustLevel"]);
    }

    #[test]
    fn empty_input_stays_empty() {
        let path = FieldPath::new("...");
        assert!(path.is_empty());
        assert_eq!(path.segments().next(), None);
    }
}
