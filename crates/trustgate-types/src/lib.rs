//! Stable DTOs and IDs used across the trustgate workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted decision and its trace
//! - stable reason codes and trace vocabulary
//! - canonical dot-path handling for context fields
//! - explain registry for reason codes and operators

#![forbid(unsafe_code)]

pub mod decision;
pub mod explain;
pub mod ids;
pub mod path;

pub use decision::{
    Action, ActionKind, Decision, Effect, NodeKind, PolicyRef, Simulation, TraceEntry,
    TraceOutcome, SCHEMA_DECISION_V1,
};
pub use explain::{lookup_explanation, ExamplePair, Explanation};
pub use path::FieldPath;
