//! Graph compiler: visual node/edge graphs into ordered expression models.
//!
//! Edges carry data flow (`source -> target`). Conditions are entry points, operators
//! fold their inputs, actions terminate a path. Each action reachable from at least one
//! condition yields one [`ExpressionModel`], in action declaration order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use trustgate_types::{Action, ActionKind, FieldPath};

use crate::error::{GraphError, MalformedExpressionError, MalformedReason};
use crate::model::{Condition, ExpressionModel, LogicalKind, LogicalNode, Node, Operator};
use crate::normalize::normalize;
use crate::policy::EngineConfig;

/// Upper bound on the size of one compiled tree. Shared sub-graphs are expanded
/// into trees, so a small DAG can otherwise unfold exponentially.
pub const MAX_COMPILED_NODES: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphNode {
    Condition {
        id: String,
        field: FieldPath,
        operator: Operator,
        #[serde(default, skip_serializing_if = "JsonValue::is_null")]
        value: JsonValue,
    },
    Operator {
        id: String,
        kind: LogicalKind,
    },
    Action {
        id: String,
        action: ActionKind,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        parameters: BTreeMap<String, JsonValue>,
    },
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Condition { id, .. }
            | GraphNode::Operator { id, .. }
            | GraphNode::Action { id, .. } => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Serialized editor graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    pub fn compile(&self, cfg: &EngineConfig) -> Result<Vec<ExpressionModel>, GraphError> {
        compile_graph(&self.nodes, &self.edges, cfg)
    }
}

/// Compile a graph into normalized expression models, one per reachable action.
///
/// The output is a pure function of the input: compiling the same graph twice yields
/// byte-identical serializations.
pub fn compile_graph(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    cfg: &EngineConfig,
) -> Result<Vec<ExpressionModel>, GraphError> {
    let index = index_nodes(nodes)?;
    let inputs = collect_inputs(nodes, edges, &index)?;
    check_acyclic(nodes, &inputs)?;

    let mut folder = Folder {
        nodes,
        inputs: &inputs,
        cfg,
        memo: vec![None; nodes.len()],
    };

    let mut expressions = Vec::new();
    for (idx, node) in nodes.iter().enumerate() {
        let GraphNode::Action {
            action, parameters, ..
        } = node
        else {
            continue;
        };
        let preds = &inputs[idx];
        if preds.is_empty() {
            continue;
        }

        let mut children = Vec::with_capacity(preds.len());
        let mut reachable = false;
        let mut size = 0;
        for &pred in preds {
            let folded = folder.fold(pred, 1)?;
            reachable |= folded.has_condition;
            size += folded.size;
            children.push(folded.node);
        }
        if !reachable {
            continue;
        }
        if size > MAX_COMPILED_NODES {
            return Err(MalformedExpressionError::new(
                node.id(),
                MalformedReason::TooLarge(MAX_COMPILED_NODES),
            )
            .into());
        }

        let root = if children.len() == 1 {
            children.remove(0)
        } else {
            Node::and(children)
        };
        let action = Action {
            kind: *action,
            parameters: parameters.clone(),
        };
        let position = expressions.len();
        let model = ExpressionModel::with_config(normalize(root), action, cfg)
            .map_err(|e| e.in_expression(position))?;
        expressions.push(model);
    }

    if expressions.is_empty() {
        return Err(GraphError::NoReachableAction);
    }
    Ok(expressions)
}

fn index_nodes(nodes: &[GraphNode]) -> Result<HashMap<&str, usize>, GraphError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id(), i).is_some() {
            return Err(GraphError::DuplicateNode(node.id().to_string()));
        }
    }
    Ok(index)
}

/// Per-node predecessor lists, in edge declaration order.
fn collect_inputs(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    index: &HashMap<&str, usize>,
) -> Result<Vec<Vec<usize>>, GraphError> {
    let lookup = |id: &str| {
        index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    };

    let mut inputs = vec![Vec::new(); nodes.len()];
    for edge in edges {
        let from = lookup(&edge.source)?;
        let to = lookup(&edge.target)?;
        let invalid = |reason| GraphError::InvalidEdge {
            from: edge.source.clone(),
            to: edge.target.clone(),
            reason,
        };

        if from == to {
            return Err(GraphError::Cyclic {
                cycle: vec![edge.source.clone(), edge.target.clone()],
            });
        }
        if matches!(nodes[from], GraphNode::Action { .. }) {
            return Err(invalid("action nodes have no outputs"));
        }
        if matches!(nodes[to], GraphNode::Condition { .. }) {
            return Err(invalid("condition nodes take no inputs"));
        }
        inputs[to].push(from);
    }
    Ok(inputs)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Iterative DFS along data flow. Reports the first cycle found, closed on its
/// starting node (`a -> b -> a`).
fn check_acyclic(nodes: &[GraphNode], inputs: &[Vec<usize>]) -> Result<(), GraphError> {
    let mut outputs = vec![Vec::new(); nodes.len()];
    for (to, preds) in inputs.iter().enumerate() {
        for &from in preds {
            outputs[from].push(to);
        }
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(&(node, next)) = stack.last() {
            let Some(&succ) = outputs[node].get(next) else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            match marks[succ] {
                Mark::Unvisited => {
                    marks[succ] = Mark::InProgress;
                    stack.push((succ, 0));
                }
                Mark::InProgress => {
                    let begin = stack.iter().position(|&(n, _)| n == succ).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[begin..]
                        .iter()
                        .map(|&(n, _)| nodes[n].id().to_string())
                        .collect();
                    cycle.push(nodes[succ].id().to_string());
                    return Err(GraphError::Cyclic { cycle });
                }
                Mark::Done => {}
            }
        }
    }
    Ok(())
}

#[derive(Clone)]
struct Folded {
    node: Node,
    size: usize,
    has_condition: bool,
}

struct Folder<'a> {
    nodes: &'a [GraphNode],
    inputs: &'a [Vec<usize>],
    cfg: &'a EngineConfig,
    memo: Vec<Option<Folded>>,
}

impl Folder<'_> {
    fn fold(&mut self, idx: usize, depth: usize) -> Result<Folded, GraphError> {
        let (nodes, inputs) = (self.nodes, self.inputs);
        let node = &nodes[idx];
        if depth > self.cfg.max_depth {
            return Err(MalformedExpressionError::new(
                node.id(),
                MalformedReason::TooDeep(self.cfg.max_depth),
            )
            .into());
        }
        if let Some(done) = &self.memo[idx] {
            return Ok(done.clone());
        }

        let folded = match node {
            GraphNode::Condition {
                field,
                operator,
                value,
                ..
            } => Folded {
                node: Node::Condition(Condition {
                    field: field.clone(),
                    operator: *operator,
                    value: value.clone(),
                }),
                size: 1,
                has_condition: true,
            },
            GraphNode::Operator { id, kind } => {
                let preds = &inputs[idx];
                if *kind == LogicalKind::Not && preds.len() != 1 {
                    return Err(MalformedExpressionError::new(
                        id.as_str(),
                        MalformedReason::NotArity(preds.len()),
                    )
                    .into());
                }

                let mut children = Vec::with_capacity(preds.len());
                let mut size = 1;
                let mut has_condition = false;
                for &pred in preds {
                    let child = self.fold(pred, depth + 1)?;
                    size += child.size;
                    has_condition |= child.has_condition;
                    children.push(child.node);
                }
                if size > MAX_COMPILED_NODES {
                    return Err(MalformedExpressionError::new(
                        id.as_str(),
                        MalformedReason::TooLarge(MAX_COMPILED_NODES),
                    )
                    .into());
                }
                Folded {
                    node: Node::Logical(LogicalNode {
                        kind: *kind,
                        children,
                    }),
                    size,
                    has_condition,
                }
            }
            // Rejected while collecting edges.
            GraphNode::Action { id, .. } => {
                return Err(GraphError::InvalidEdge {
                    from: id.clone(),
                    to: String::new(),
                    reason: "action nodes have no outputs",
                });
            }
        };

        self.memo[idx] = Some(folded.clone());
        Ok(folded)
    }
}
