//! Fuzz target for visual graph compilation.
//!
//! Goal: compilation **never panics** and never loops on cyclic input. Arbitrary wiring
//! (cycles, dangling edges, edges into conditions) must come back as `GraphError`.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_graph_compiler
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;
use trustgate_domain::{EngineConfig, GraphEdge, GraphNode, compile_graph};

#[derive(Arbitrary, Debug)]
enum NodeSpec {
    Condition { field: u8, op: u8, value: i16 },
    Operator { kind: u8 },
    Action { kind: u8 },
}

#[derive(Arbitrary, Debug)]
struct GraphInput {
    nodes: Vec<NodeSpec>,
    /// Edges by node index; out-of-range indices produce unknown ids.
    edges: Vec<(u8, u8)>,
}

const FIELDS: [&str; 4] = ["subject.trustLevel", "resource.owner", "action", "environment.ip"];
const OPERATORS: [&str; 5] = ["equals", "notEquals", "greaterThan", "lessThanOrEqual", "exists"];
const LOGICAL: [&str; 3] = ["AND", "OR", "NOT"];
const ACTIONS: [&str; 4] = ["allow", "deny", "log", "throttle"];

fn build(index: usize, spec: &NodeSpec) -> Option<GraphNode> {
    let id = format!("n{index}");
    let value = match spec {
        NodeSpec::Condition { field, op, value } => {
            let op = OPERATORS[*op as usize % OPERATORS.len()];
            let value = if op == "exists" { json!(true) } else { json!(value) };
            json!({
                "type": "condition",
                "id": id,
                "field": FIELDS[*field as usize % FIELDS.len()],
                "operator": op,
                "value": value,
            })
        }
        NodeSpec::Operator { kind } => json!({
            "type": "operator",
            "id": id,
            "kind": LOGICAL[*kind as usize % LOGICAL.len()],
        }),
        NodeSpec::Action { kind } => json!({
            "type": "action",
            "id": id,
            "action": ACTIONS[*kind as usize % ACTIONS.len()],
        }),
    };
    serde_json::from_value(value).ok()
}

fuzz_target!(|input: GraphInput| {
    // Limit input size to keep fuzzing fast
    if input.nodes.len() > 64 || input.edges.len() > 256 {
        return;
    }

    let nodes: Vec<GraphNode> = input
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(i, spec)| build(i, spec))
        .collect();
    let edges: Vec<GraphEdge> = input
        .edges
        .iter()
        .map(|(s, t)| GraphEdge::new(&format!("n{s}"), &format!("n{t}")))
        .collect();

    // Should never panic - errors are fine
    let _ = compile_graph(&nodes, &edges, &EngineConfig::default());
});
