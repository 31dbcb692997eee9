use serde_json::Value as JsonValue;

use crate::error::{MalformedExpressionError, MalformedReason};
use crate::model::{Condition, LogicalKind, Node, Operator};
use crate::operators::compiled_glob;
use crate::trust::TrustLevel;

/// Structural validation of an expression tree.
///
/// Rejects empty AND/OR, NOT without exactly one child, conditions whose value does not fit
/// the operator, and trees deeper than `max_depth`.
pub fn validate_node(root: &Node, max_depth: usize) -> Result<(), MalformedExpressionError> {
    validate_at(root, "0", 1, max_depth)
}

fn validate_at(
    node: &Node,
    path: &str,
    depth: usize,
    max_depth: usize,
) -> Result<(), MalformedExpressionError> {
    if depth > max_depth {
        return Err(MalformedExpressionError::new(
            path,
            MalformedReason::TooDeep(max_depth),
        ));
    }

    match node {
        Node::Constant { .. } => Ok(()),
        Node::Condition(c) => validate_condition(c)
            .map_err(|reason| MalformedExpressionError::new(path, reason)),
        Node::Logical(l) => {
            match (l.kind, l.children.len()) {
                (LogicalKind::Not, 1) => {}
                (LogicalKind::Not, n) => {
                    return Err(MalformedExpressionError::new(
                        path,
                        MalformedReason::NotArity(n),
                    ));
                }
                (kind, 0) => {
                    return Err(MalformedExpressionError::new(
                        path,
                        MalformedReason::EmptyLogical(kind),
                    ));
                }
                _ => {}
            }
            for (i, child) in l.children.iter().enumerate() {
                validate_at(child, &format!("{path}.{i}"), depth + 1, max_depth)?;
            }
            Ok(())
        }
    }
}

fn validate_condition(c: &Condition) -> Result<(), MalformedReason> {
    if c.field.is_empty() {
        return Err(MalformedReason::EmptyField);
    }

    let mismatch = |expected: &'static str| MalformedReason::ValueType {
        operator: c.operator,
        expected,
    };

    match c.operator {
        Operator::Equals | Operator::NotEquals | Operator::Contains => Ok(()),
        Operator::In | Operator::NotIn => match c.value {
            JsonValue::Array(_) => Ok(()),
            _ => Err(mismatch("an array value")),
        },
        Operator::GreaterThan
        | Operator::GreaterThanOrEqual
        | Operator::LessThan
        | Operator::LessThanOrEqual => match &c.value {
            JsonValue::Number(_) => Ok(()),
            JsonValue::String(s) if s.parse::<TrustLevel>().is_ok() => Ok(()),
            _ => Err(mismatch("a number or a trust level")),
        },
        Operator::Matches => match &c.value {
            JsonValue::String(pattern) => compiled_glob(pattern).map(|_| ()),
            _ => Err(mismatch("a glob pattern string")),
        },
        Operator::Exists => match c.value {
            JsonValue::Null | JsonValue::Bool(true) => Ok(()),
            _ => Err(mismatch("no value, null, or true")),
        },
    }
}
