//! Canonical form of expression trees.
//!
//! Rules, applied bottom-up until nothing changes (a single pass suffices):
//! - nested same-kind AND/OR are flattened into their parent
//! - identity constants are dropped (`AND(true, X)` -> `X`, `OR(false, X)` -> `X`)
//! - absorbing constants win (`AND(false, ..)` -> `false`, `OR(true, ..)` -> `true`)
//! - structurally identical siblings are deduplicated, first occurrence kept
//! - empty AND/OR become constants, single-child AND/OR collapse to the child
//! - `NOT(NOT(X))` -> `X`, `NOT(c)` -> `!c`

use std::collections::HashSet;

use crate::fingerprint::canonical_json;
use crate::model::{LogicalKind, LogicalNode, Node};

pub fn normalize(node: Node) -> Node {
    match node {
        Node::Condition(_) | Node::Constant { .. } => node,
        Node::Logical(LogicalNode {
            kind: LogicalKind::Not,
            children,
        }) => normalize_not(children),
        Node::Logical(LogicalNode { kind, children }) => normalize_junction(kind, children),
    }
}

fn normalize_not(children: Vec<Node>) -> Node {
    let mut iter = children.into_iter();
    match (iter.next(), iter.next()) {
        (Some(child), None) => match normalize(child) {
            Node::Constant { value } => Node::constant(!value),
            Node::Logical(LogicalNode {
                kind: LogicalKind::Not,
                children: mut inner,
            }) if inner.len() == 1 => inner.remove(0),
            other => Node::not(other),
        },
        // Malformed arity is left for validation to report.
        (first, second) => Node::Logical(LogicalNode {
            kind: LogicalKind::Not,
            children: first
                .into_iter()
                .chain(second)
                .chain(iter)
                .map(normalize)
                .collect(),
        }),
    }
}

fn normalize_junction(kind: LogicalKind, children: Vec<Node>) -> Node {
    let identity = kind == LogicalKind::And;
    let absorbing = !identity;

    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    let mut seen: HashSet<String> = HashSet::new();

    for child in children {
        let flattened = match normalize(child) {
            Node::Logical(inner) if inner.kind == kind => inner.children,
            other => vec![other],
        };
        for node in flattened {
            match node {
                Node::Constant { value } if value == identity => continue,
                Node::Constant { value } if value == absorbing => {
                    return Node::constant(absorbing);
                }
                _ => {}
            }
            if seen.insert(canonical_json(&node)) {
                out.push(node);
            }
        }
    }

    match out.len() {
        0 => Node::constant(identity),
        1 => out.remove(0),
        _ => Node::Logical(LogicalNode {
            kind,
            children: out,
        }),
    }
}
