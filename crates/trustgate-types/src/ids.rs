//! Stable identifiers for decision reasons and condition operators.
//!
//! Reason codes are short snake_case discriminators carried on `Decision.reason`.
//! Operator names use the camelCase spelling found in stored policy documents.

// Reasons
pub const REASON_MATCHED: &str = "matched";
pub const REASON_NO_MATCH: &str = "no_match";
pub const REASON_POLICY_NOT_FOUND: &str = "policy_not_found";
pub const REASON_STORAGE_UNAVAILABLE: &str = "storage_unavailable";
pub const REASON_POLICY_INACTIVE: &str = "policy_inactive";
pub const REASON_MALFORMED_EXPRESSION: &str = "malformed_expression";

// Operators
pub const OP_EQUALS: &str = "equals";
pub const OP_NOT_EQUALS: &str = "notEquals";
pub const OP_IN: &str = "in";
pub const OP_NOT_IN: &str = "notIn";
pub const OP_GREATER_THAN: &str = "greaterThan";
pub const OP_GREATER_THAN_OR_EQUAL: &str = "greaterThanOrEqual";
pub const OP_LESS_THAN: &str = "lessThan";
pub const OP_LESS_THAN_OR_EQUAL: &str = "lessThanOrEqual";
pub const OP_CONTAINS: &str = "contains";
pub const OP_MATCHES: &str = "matches";
pub const OP_EXISTS: &str = "exists";

// Trace notes
pub const NOTE_INCOMPARABLE: &str = "incomparable";
pub const NOTE_NON_TERMINAL: &str = "non_terminal_action";
pub const NOTE_SHORT_CIRCUIT: &str = "short_circuit";
pub const NOTE_EARLIER_MATCH: &str = "earlier_expression_matched";
