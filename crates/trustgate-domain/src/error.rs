//! Error taxonomy of the pure core.
//!
//! Construction paths (expression building, graph compilation, simulation) return these
//! to the caller. The evaluator never does: it converts them into a deny decision.

use crate::model::{LogicalKind, Operator};

/// Structurally invalid expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}at {location}: {reason}", expression_prefix(.expression))]
pub struct MalformedExpressionError {
    /// Index of the expression inside its policy document, when known.
    pub expression: Option<usize>,
    /// Tree path (`0.1.2`) or graph node id the problem was found at.
    pub location: String,
    pub reason: MalformedReason,
}

fn expression_prefix(expression: &Option<usize>) -> String {
    match expression {
        Some(index) => format!("expression {index} "),
        None => String::new(),
    }
}

impl MalformedExpressionError {
    pub fn new(location: impl Into<String>, reason: MalformedReason) -> Self {
        Self {
            expression: None,
            location: location.into(),
            reason,
        }
    }

    pub fn in_expression(mut self, index: usize) -> Self {
        self.expression = Some(index);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("{0} node has no children")]
    EmptyLogical(LogicalKind),
    #[error("NOT node must have exactly one child, found {0}")]
    NotArity(usize),
    #[error("condition has an empty field path")]
    EmptyField,
    #[error("operator {operator} expects {expected}")]
    ValueType {
        operator: Operator,
        expected: &'static str,
    },
    #[error("invalid glob pattern: {0}")]
    InvalidPattern(String),
    #[error("expression deeper than the maximum depth of {0}")]
    TooDeep(usize),
    #[error("compiled expression exceeds {0} nodes")]
    TooLarge(usize),
}

/// Rejections raised by the graph compiler.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("graph contains a cycle: {}", cycle.join(" -> "))]
    Cyclic { cycle: Vec<String> },
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: String,
        to: String,
        reason: &'static str,
    },
    #[error("graph has no action reachable from a condition")]
    NoReachableAction,
    #[error(transparent)]
    Malformed(#[from] MalformedExpressionError),
}
