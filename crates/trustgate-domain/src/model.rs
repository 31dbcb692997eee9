use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;
use trustgate_types::{Action, FieldPath};

use crate::error::MalformedExpressionError;
use crate::policy::EngineConfig;
use crate::validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    Matches,
    Exists,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        use trustgate_types::ids::*;
        match self {
            Operator::Equals => OP_EQUALS,
            Operator::NotEquals => OP_NOT_EQUALS,
            Operator::In => OP_IN,
            Operator::NotIn => OP_NOT_IN,
            Operator::GreaterThan => OP_GREATER_THAN,
            Operator::GreaterThanOrEqual => OP_GREATER_THAN_OR_EQUAL,
            Operator::LessThan => OP_LESS_THAN,
            Operator::LessThanOrEqual => OP_LESS_THAN_OR_EQUAL,
            Operator::Contains => OP_CONTAINS,
            Operator::Matches => OP_MATCHES,
            Operator::Exists => OP_EXISTS,
        }
    }

    /// Ordering operators compare numbers or trust-level ranks.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf predicate over one context field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub field: FieldPath,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub value: JsonValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalKind {
    And,
    Or,
    Not,
}

impl LogicalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalKind::And => "AND",
            LogicalKind::Or => "OR",
            LogicalKind::Not => "NOT",
        }
    }
}

impl fmt::Display for LogicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogicalNode {
    pub kind: LogicalKind,
    pub children: Vec<Node>,
}

/// One node of an expression tree.
///
/// `Constant` only appears as the result of normalization (vacuous AND/OR branches).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Condition(Condition),
    Logical(LogicalNode),
    Constant { value: bool },
}

impl Node {
    pub fn condition(field: &str, operator: Operator, value: JsonValue) -> Self {
        Node::Condition(Condition {
            field: FieldPath::new(field),
            operator,
            value,
        })
    }

    pub fn and(children: Vec<Node>) -> Self {
        Node::Logical(LogicalNode {
            kind: LogicalKind::And,
            children,
        })
    }

    pub fn or(children: Vec<Node>) -> Self {
        Node::Logical(LogicalNode {
            kind: LogicalKind::Or,
            children,
        })
    }

    pub fn not(child: Node) -> Self {
        Node::Logical(LogicalNode {
            kind: LogicalKind::Not,
            children: vec![child],
        })
    }

    pub fn constant(value: bool) -> Self {
        Node::Constant { value }
    }

    /// Height of the tree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            Node::Logical(l) => 1 + l.children.iter().map(Node::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

/// One evaluable rule: a logical tree mapped to a single action.
///
/// Built through [`ExpressionModel::new`], which validates the tree. Deserialized
/// instances are not trusted; the evaluator validates them again before walking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpressionModel {
    root: Node,
    action: Action,
}

impl ExpressionModel {
    pub fn new(root: Node, action: Action) -> Result<Self, MalformedExpressionError> {
        Self::with_config(root, action, &EngineConfig::default())
    }

    pub fn with_config(
        root: Node,
        action: Action,
        cfg: &EngineConfig,
    ) -> Result<Self, MalformedExpressionError> {
        validate::validate_node(&root, cfg.max_depth)?;
        Ok(Self { root, action })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn validate(&self, cfg: &EngineConfig) -> Result<(), MalformedExpressionError> {
        validate::validate_node(&self.root, cfg.max_depth)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl PolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyStatus::Draft => "draft",
            PolicyStatus::Active => "active",
            PolicyStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted, versioned unit of authorization logic scoped to an organization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub status: PolicyStatus,
    /// Evaluation order is significant: the first matching expression wins.
    #[serde(default)]
    pub expressions: Vec<ExpressionModel>,
    #[serde(default)]
    pub created_by: String,
    #[schemars(with = "String")]
    #[serde(default = "unix_epoch", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

fn first_version() -> u32 {
    1
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

impl PolicyDocument {
    /// Validate every expression, reporting the first malformed one.
    pub fn validate(&self, cfg: &EngineConfig) -> Result<(), MalformedExpressionError> {
        for (index, expr) in self.expressions.iter().enumerate() {
            expr.validate(cfg).map_err(|e| e.in_expression(index))?;
        }
        Ok(())
    }

    /// Whether the document belongs to the given organization scope.
    ///
    /// Documents without an organization are global and visible to every scope.
    pub fn visible_to(&self, organization_id: Option<&str>) -> bool {
        match (&self.organization_id, organization_id) {
            (None, _) => true,
            (Some(owner), Some(scope)) => owner == scope,
            (Some(_), None) => false,
        }
    }
}

/// Runtime facts a decision is computed against. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    #[serde(default)]
    pub subject: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub resource: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub environment: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl EvaluationContext {
    /// Resolve a dot-path against the context.
    ///
    /// Returns `None` for unknown roots, absent keys, out-of-range indices and
    /// explicit `null` values: all of these count as a missing field.
    pub fn resolve(&self, path: &FieldPath) -> Option<Cow<'_, JsonValue>> {
        let mut segments = path.segments();
        let root = segments.next()?;

        let map = match root {
            "subject" => &self.subject,
            "resource" => &self.resource,
            "environment" => &self.environment,
            "action" => {
                return segments
                    .next()
                    .is_none()
                    .then(|| Cow::Owned(JsonValue::String(self.action.clone())));
            }
            "organizationId" => {
                if segments.next().is_some() {
                    return None;
                }
                return self
                    .organization_id
                    .as_ref()
                    .map(|org| Cow::Owned(JsonValue::String(org.clone())));
            }
            _ => return None,
        };

        let Some(first) = segments.next() else {
            let whole: serde_json::Map<String, JsonValue> =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            return Some(Cow::Owned(JsonValue::Object(whole)));
        };

        let mut current = map.get(first)?;
        for segment in segments {
            current = match current {
                JsonValue::Object(obj) => obj.get(segment)?,
                JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        if current.is_null() {
            None
        } else {
            Some(Cow::Borrowed(current))
        }
    }
}
