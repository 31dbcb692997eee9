//! Public facade over the trustgate engine.
//!
//! Embedders that only need the pure core (build or compile expressions, evaluate them
//! against a context, read the decision) depend on this crate alone. Storage, caching
//! and the CLI live in their own crates.
//!
//! ```
//! use serde_json::json;
//! use trustgate::{ActionKind, Evaluator, PolicyDocument};
//!
//! let doc: PolicyDocument = serde_json::from_value(json!({
//!     "id": "trust-gate",
//!     "status": "active",
//!     "expressions": [{
//!         "root": {
//!             "type": "condition",
//!             "field": "subject.trustLevel",
//!             "operator": "greaterThanOrEqual",
//!             "value": "VERIFIED"
//!         },
//!         "action": { "kind": "allow" }
//!     }]
//! }))
//! .unwrap();
//! let ctx = serde_json::from_value(json!({ "subject": { "trustLevel": "TRUSTED" } })).unwrap();
//!
//! let decision = Evaluator::default().evaluate(&doc, &ctx);
//! assert!(decision.is_allowed());
//! assert_eq!(decision.action.unwrap().kind, ActionKind::Allow);
//! ```

#![forbid(unsafe_code)]

pub use trustgate_domain::{
    Condition, EngineConfig, EvaluationContext, Evaluator, ExpressionModel, GraphDocument,
    GraphEdge, GraphError, GraphNode, LogicalKind, LogicalNode, MalformedExpressionError,
    MalformedReason, Node, Operator, PolicyDocument, PolicyStatus, TrustLevel, compile_graph,
    normalize,
};
pub use trustgate_types::{
    Action, ActionKind, Decision, Effect, FieldPath, NodeKind, PolicyRef, Simulation,
    TraceEntry, TraceOutcome,
};
