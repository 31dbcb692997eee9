//! Explain registry for reason codes and condition operators.
//!
//! Maps reason codes and operator names to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a reason code or operator.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the reason/operator.
    pub title: &'static str,
    /// What it means and when it applies.
    pub description: &'static str,
    /// What to do about it.
    pub remediation: &'static str,
    /// Example condition and a context it is evaluated against.
    pub examples: ExamplePair,
}

/// A condition (JSON) and an evaluation context (JSON) illustrating the entry.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    pub condition: &'static str,
    pub context: &'static str,
}

/// Look up an explanation by reason code or operator name.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Reasons
        ids::REASON_MATCHED => Some(explain_matched()),
        ids::REASON_NO_MATCH => Some(explain_no_match()),
        ids::REASON_POLICY_NOT_FOUND => Some(explain_policy_not_found()),
        ids::REASON_STORAGE_UNAVAILABLE => Some(explain_storage_unavailable()),
        ids::REASON_POLICY_INACTIVE => Some(explain_policy_inactive()),
        ids::REASON_MALFORMED_EXPRESSION => Some(explain_malformed_expression()),

        // Operators
        ids::OP_EQUALS | ids::OP_NOT_EQUALS => Some(explain_equality()),
        ids::OP_IN | ids::OP_NOT_IN => Some(explain_membership()),
        ids::OP_GREATER_THAN
        | ids::OP_GREATER_THAN_OR_EQUAL
        | ids::OP_LESS_THAN
        | ids::OP_LESS_THAN_OR_EQUAL => Some(explain_ordering()),
        ids::OP_CONTAINS => Some(explain_contains()),
        ids::OP_MATCHES => Some(explain_matches()),
        ids::OP_EXISTS => Some(explain_exists()),

        _ => None,
    }
}

/// List all known reason codes.
pub fn all_reasons() -> &'static [&'static str] {
    &[
        ids::REASON_MATCHED,
        ids::REASON_NO_MATCH,
        ids::REASON_POLICY_NOT_FOUND,
        ids::REASON_STORAGE_UNAVAILABLE,
        ids::REASON_POLICY_INACTIVE,
        ids::REASON_MALFORMED_EXPRESSION,
    ]
}

/// List all known operators.
pub fn all_operators() -> &'static [&'static str] {
    &[
        ids::OP_EQUALS,
        ids::OP_NOT_EQUALS,
        ids::OP_IN,
        ids::OP_NOT_IN,
        ids::OP_GREATER_THAN,
        ids::OP_GREATER_THAN_OR_EQUAL,
        ids::OP_LESS_THAN,
        ids::OP_LESS_THAN_OR_EQUAL,
        ids::OP_CONTAINS,
        ids::OP_MATCHES,
        ids::OP_EXISTS,
    ]
}

// --- Reasons ---

fn explain_matched() -> Explanation {
    Explanation {
        title: "Expression Matched",
        description: "\
An expression of the policy evaluated to true and its action is terminal.

Expressions are evaluated in document order and the first matching expression wins.
There is no numeric priority: moving an expression up the list is how you give it precedence.",
        remediation: "\
Nothing to fix. Inspect `matchedExpressionIndex` and the trace to see which
conditions were satisfied.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "subject.trustLevel", "operator": "greaterThanOrEqual", "value": "VERIFIED" }"#,
            context: r#"{ "subject": { "trustLevel": "TRUSTED" } }"#,
        },
    }
}

fn explain_no_match() -> Explanation {
    Explanation {
        title: "No Expression Matched",
        description: "\
Every expression evaluated to false (or only non-terminal `log`/`alert` actions matched).

Evaluation is fail-closed: when nothing grants or denies explicitly, the request is denied.",
        remediation: "\
Check the trace for conditions that evaluated to false or reported `fieldMissing`.
If access should be granted, add an expression with an `allow` action that covers the request.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "subject.department", "operator": "equals", "value": "finance" }"#,
            context: r#"{ "subject": { "department": "sales" } }"#,
        },
    }
}

fn explain_policy_not_found() -> Explanation {
    Explanation {
        title: "Policy Not Found",
        description: "\
The requested policy does not exist, belongs to another organization, or has been archived.

A missing policy never fails the request with an error; it produces a deny decision.",
        remediation: "\
Verify the policy id and the `organizationId` of the evaluation context.
Archived policies must be recreated; they are kept only for the audit trail.",
        examples: ExamplePair {
            condition: "(none: the policy could not be loaded)",
            context: r#"{ "organizationId": "org-unknown" }"#,
        },
    }
}

fn explain_storage_unavailable() -> Explanation {
    Explanation {
        title: "Storage Unavailable",
        description: "\
The policy store timed out or failed while loading the policy.

The request is denied exactly as if the policy did not exist, but the condition is
logged separately so operators can tell outages apart from configuration mistakes.",
        remediation: "\
Check the health of the policy store. Requests will succeed again once the store
recovers or once the policy is served from cache.",
        examples: ExamplePair {
            condition: "(none: the policy could not be loaded)",
            context: "{}",
        },
    }
}

fn explain_policy_inactive() -> Explanation {
    Explanation {
        title: "Policy Not Active",
        description: "\
The policy exists but is still a draft. Drafts are evaluated only through simulation
unless `engine.evaluate_drafts` is enabled.",
        remediation: "\
Publish the policy to make it enforceable, or use `simulate` to test the draft.",
        examples: ExamplePair {
            condition: "(any)",
            context: "{}",
        },
    }
}

fn explain_malformed_expression() -> Explanation {
    Explanation {
        title: "Malformed Expression",
        description: "\
An expression is structurally invalid: an empty AND/OR, a NOT without exactly one child,
an operator whose value has the wrong type, an invalid glob, or a tree deeper than the
configured maximum depth.

At evaluation time the whole decision becomes a deny and the trace carries the error.",
        remediation: "\
Recompile the policy from its graph or fix the stored document. `simulate` reports the
validation error directly.",
        examples: ExamplePair {
            condition: r#"{ "type": "logical", "kind": "NOT", "children": [] }"#,
            context: "{}",
        },
    }
}

// --- Operators ---

fn explain_equality() -> Explanation {
    Explanation {
        title: "equals / notEquals",
        description: "\
Compares the field with the value using JSON equality. Numbers compare numerically,
so `1` equals `1.0`. A missing field makes the condition false for both operators.",
        remediation: "\
Use `exists` first (or wrap in NOT) when absence should be treated differently.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "action", "operator": "equals", "value": "read" }"#,
            context: r#"{ "action": "read" }"#,
        },
    }
}

fn explain_membership() -> Explanation {
    Explanation {
        title: "in / notIn",
        description: "\
The value must be an array. The condition holds when the field equals (or, for `notIn`,
equals none of) the array elements.",
        remediation: "\
Store the allowed values as a JSON array. A scalar value is rejected as malformed.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "subject.role", "operator": "in", "value": ["admin", "owner"] }"#,
            context: r#"{ "subject": { "role": "owner" } }"#,
        },
    }
}

fn explain_ordering() -> Explanation {
    Explanation {
        title: "greaterThan / greaterThanOrEqual / lessThan / lessThanOrEqual",
        description: "\
Numbers compare numerically. Strings compare as trust levels using the fixed order
UNKNOWN < BASIC < VERIFIED < TRUSTED < PRIVILEGED (case-insensitive).

Any other pairing is incomparable and evaluates to false with an `incomparable` note.",
        remediation: "\
Use a number or one of the trust level names as the value. Other strings are rejected
as malformed when the expression is built.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "subject.trustLevel", "operator": "greaterThanOrEqual", "value": "VERIFIED" }"#,
            context: r#"{ "subject": { "trustLevel": "PRIVILEGED" } }"#,
        },
    }
}

fn explain_contains() -> Explanation {
    Explanation {
        title: "contains",
        description: "\
For string fields: the value is a substring of the field. For array fields: some element
equals the value. Any other field type evaluates to false.",
        remediation: "\
Use `in` when you want to test a scalar field against a list.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "subject.groups", "operator": "contains", "value": "security" }"#,
            context: r#"{ "subject": { "groups": ["eng", "security"] } }"#,
        },
    }
}

fn explain_matches() -> Explanation {
    Explanation {
        title: "matches",
        description: "\
Glob match of a string field against the value. Matching is case-sensitive and anchored:
- `*` matches any run of characters, including `.` and `/`
- `?` matches exactly one character
- `[abc]` / `[a-z]` match one character from a class
- `{a,b}` matches either alternative

Invalid patterns are rejected as malformed when the expression is built.",
        remediation: "\
Escape literal metacharacters with a class, e.g. `[*]` for a literal asterisk.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "resource.path", "operator": "matches", "value": "/reports/*.pdf" }"#,
            context: r#"{ "resource": { "path": "/reports/2024/q1.pdf" } }"#,
        },
    }
}

fn explain_exists() -> Explanation {
    Explanation {
        title: "exists",
        description: "\
Holds when the field resolves to a non-null value. The value must be omitted, `null`,
or `true`; use NOT(exists) to test for absence.",
        remediation: "\
Wrap the condition in a NOT node to require that a field is absent.",
        examples: ExamplePair {
            condition: r#"{ "type": "condition", "field": "environment.mfa", "operator": "exists" }"#,
            context: r#"{ "environment": { "mfa": "totp" } }"#,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_identifier_has_an_explanation() {
        for id in all_reasons().iter().chain(all_operators()) {
            assert!(lookup_explanation(id).is_some(), "missing explanation for {id}");
        }
    }

    #[test]
    fn unknown_identifier_is_none() {
        assert!(lookup_explanation("deps.no_wildcards").is_none());
    }
}
