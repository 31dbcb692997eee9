//! Cache key scheme.
//!
//! ```text
//! policy:{policyId}:{organizationId|default}
//! policies:list:{organizationId|all}:{queryHash}
//! evaluation:{policyId}:{version}:{contextHash}
//! ```
//!
//! Identifiers are escaped when placed into invalidation patterns, so an id such as
//! `*` only ever invalidates its own entries.

use serde::Serialize;
use trustgate_domain::fingerprint::fingerprint;

pub const DEFAULT_ORG: &str = "default";
pub const ALL_ORGS: &str = "all";

/// Matches every cached search page.
pub const LIST_PATTERN: &str = "policies:list:*";

pub fn policy_key(policy_id: &str, organization_id: Option<&str>) -> String {
    format!(
        "policy:{policy_id}:{}",
        organization_id.unwrap_or(DEFAULT_ORG)
    )
}

pub fn list_key(organization_id: Option<&str>, query_hash: &str) -> String {
    format!(
        "policies:list:{}:{query_hash}",
        organization_id.unwrap_or(ALL_ORGS)
    )
}

pub fn evaluation_key(policy_id: &str, version: u32, context_hash: &str) -> String {
    format!("evaluation:{policy_id}:{version}:{context_hash}")
}

/// Every cached copy of one policy, across organization scopes.
pub fn policy_pattern(policy_id: &str) -> String {
    format!("policy:{}:*", escape_glob(policy_id))
}

/// Every cached decision for one policy, across versions and contexts.
pub fn evaluation_pattern(policy_id: &str) -> String {
    format!("evaluation:{}:*", escape_glob(policy_id))
}

/// SHA-256 of the canonical JSON of a query or context.
pub fn query_hash<T: Serialize + ?Sized>(query: &T) -> String {
    fingerprint(query)
}

/// Backslash-escape glob metacharacters.
pub fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\' | '!' | ',') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_layout() {
        assert_eq!(policy_key("p1", None), "policy:p1:default");
        assert_eq!(policy_key("p1", Some("org-a")), "policy:p1:org-a");
        assert_eq!(list_key(None, "abc"), "policies:list:all:abc");
        assert_eq!(evaluation_key("p1", 3, "ff"), "evaluation:p1:3:ff");
        assert_eq!(policy_pattern("p1"), "policy:p1:*");
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(escape_glob("a*b?[c]{d}"), r"a\*b\?\[c\]\{d\}");
        assert_eq!(policy_pattern("*"), r"policy:\*:*");
    }

    #[test]
    fn query_hash_ignores_key_order() {
        let a = json!({ "limit": 10, "status": "active" });
        let b = json!({ "status": "active", "limit": 10 });
        assert_eq!(query_hash(&a), query_hash(&b));
        assert_ne!(query_hash(&a), query_hash(&json!({ "limit": 11 })));
    }
}
