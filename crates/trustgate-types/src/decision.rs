use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::ids;

/// Stable schema identifier for emitted decisions.
pub const SCHEMA_DECISION_V1: &str = "trustgate.decision.v1";

/// Terminal outcome of an evaluation. Deliberately three-valued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
    Throttle,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
            Effect::Throttle => "throttle",
        }
    }
}

/// What a matching expression asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Allow,
    Deny,
    Throttle,
    Log,
    Alert,
    RequireApproval,
}

impl ActionKind {
    /// Terminal actions end evaluation; `log` and `alert` only record an effect.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ActionKind::Log | ActionKind::Alert)
    }

    /// Decision produced by a terminal action. Approval-gated requests stay denied.
    pub fn effect(self) -> Option<Effect> {
        match self {
            ActionKind::Allow => Some(Effect::Allow),
            ActionKind::Deny | ActionKind::RequireApproval => Some(Effect::Deny),
            ActionKind::Throttle => Some(Effect::Throttle),
            ActionKind::Log | ActionKind::Alert => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Allow => "allow",
            ActionKind::Deny => "deny",
            ActionKind::Throttle => "throttle",
            ActionKind::Log => "log",
            ActionKind::Alert => "alert",
            ActionKind::RequireApproval => "requireApproval",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, JsonValue>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: &str, value: JsonValue) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}

/// Kind of node a trace entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Policy,
    Expression,
    And,
    Or,
    Not,
    Condition,
    Constant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TraceOutcome {
    True,
    False,
    NotEvaluated,
    Error,
}

impl TraceOutcome {
    pub fn from_bool(value: bool) -> Self {
        if value {
            TraceOutcome::True
        } else {
            TraceOutcome::False
        }
    }
}

/// One visited (or deliberately skipped) node.
///
/// `path` is the dotted child-index path of the node within its expression:
/// `"0"` is the root, `"0.1"` the root's second child. Policy- and expression-level
/// entries use `"-"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<usize>,
    pub path: String,
    pub node: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<JsonValue>,

    pub outcome: TraceOutcome,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub field_missing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TraceEntry {
    pub fn new(node: NodeKind, path: impl Into<String>, outcome: TraceOutcome) -> Self {
        Self {
            expression: None,
            path: path.into(),
            node,
            field: None,
            operator: None,
            expected: None,
            actual: None,
            outcome,
            field_missing: false,
            error: None,
            note: None,
        }
    }

    /// Entry for the policy as a whole (lookup failures, status gates).
    pub fn policy(outcome: TraceOutcome) -> Self {
        Self::new(NodeKind::Policy, "-", outcome)
    }

    pub fn in_expression(mut self, index: usize) -> Self {
        self.expression = Some(index);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyRef {
    pub id: String,
    pub version: u32,
}

/// Evaluation output. Exactly one terminal effect per evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub decision: Effect,
    /// Stable reason code (see [`crate::ids`]).
    pub reason: String,
    /// Index of the winning expression; `null` when nothing matched.
    pub matched_expression_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Non-terminal actions (`log`, `alert`) whose expressions matched on the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyRef>,

    pub trace: Vec<TraceEntry>,
    pub processing_time_ms: f64,
}

impl Decision {
    /// Fail-closed decision with no matched expression.
    pub fn deny(reason: &str) -> Self {
        Self {
            decision: Effect::Deny,
            reason: reason.to_string(),
            matched_expression_index: None,
            action: None,
            effects: Vec::new(),
            policy: None,
            trace: Vec::new(),
            processing_time_ms: 0.0,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Effect::Allow
    }

    pub fn matched(&self) -> bool {
        self.reason == ids::REASON_MATCHED
    }
}

/// Output of a what-if evaluation over an unsaved document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Simulation {
    #[serde(flatten)]
    pub decision: Decision,
    pub simulation: bool,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unmatched_index_serializes_as_null() {
        let decision = Decision::deny(ids::REASON_NO_MATCH);
        let value = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(value["decision"], "deny");
        assert_eq!(value["matchedExpressionIndex"], JsonValue::Null);
        assert!(value.get("effects").is_none());
    }

    #[test]
    fn field_missing_is_omitted_unless_set() {
        let mut entry = TraceEntry::new(NodeKind::Condition, "0", TraceOutcome::False);
        let value = serde_json::to_value(&entry).expect("serialize");
        assert!(value.get("fieldMissing").is_none());

        entry.field_missing = true;
        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(value["fieldMissing"], json!(true));
    }

    #[test]
    fn not_evaluated_uses_kebab_case() {
        let value = serde_json::to_value(TraceOutcome::NotEvaluated).expect("serialize");
        assert_eq!(value, json!("not-evaluated"));
    }

    #[test]
    fn require_approval_denies() {
        assert_eq!(ActionKind::RequireApproval.effect(), Some(Effect::Deny));
        assert!(ActionKind::RequireApproval.is_terminal());
        assert!(!ActionKind::Alert.is_terminal());
        assert_eq!(ActionKind::Log.effect(), None);
    }

    #[test]
    fn simulation_flattens_decision() {
        let sim = Simulation {
            decision: Decision::deny(ids::REASON_NO_MATCH),
            simulation: true,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&sim).expect("serialize");
        assert_eq!(value["decision"], "deny");
        assert_eq!(value["simulation"], json!(true));
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }
}
