//! Pure policy evaluation (no IO).
//!
//! Input: policy documents, editor graphs and evaluation contexts constructed elsewhere.
//! Output: compiled expression models and decisions with a full trace.

#![forbid(unsafe_code)]

pub mod error;
pub mod fingerprint;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod operators;
pub mod policy;
pub mod trust;

mod engine;
mod validate;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{Evaluator, lookup_failure};
pub use error::{GraphError, MalformedExpressionError, MalformedReason};
pub use graph::{GraphDocument, GraphEdge, GraphNode, compile_graph};
pub use model::{
    Condition, EvaluationContext, ExpressionModel, LogicalKind, LogicalNode, Node, Operator,
    PolicyDocument, PolicyStatus,
};
pub use normalize::normalize;
pub use policy::EngineConfig;
pub use trust::TrustLevel;
