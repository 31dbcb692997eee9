//! Use case orchestration for trustgate.
//!
//! This crate provides the application layer: the policy service that combines storage,
//! cache and the pure evaluator, plus the use cases the CLI drives. It is intentionally thin
//! and delegates heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod compile;
mod config;
mod error;
mod evaluate;
mod explain;
mod render;
mod service;

pub use compile::{CompileOutput, run_compile};
pub use config::load_config;
pub use error::ServiceError;
pub use evaluate::{
    EvaluateInput, SimulateInput, decision_exit_code, run_evaluate, run_simulate,
};
pub use explain::{ExplainOutput, format_explain, run_explain};
pub use render::{render_markdown, render_summary, serialize_json, write_text};
pub use service::PolicyService;
