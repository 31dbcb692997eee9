//! The `compile` use case: visual graph to ordered expressions.

use anyhow::Context;
use serde::Serialize;
use trustgate_domain::fingerprint::fingerprint;
use trustgate_domain::{ExpressionModel, GraphDocument};
use trustgate_settings::ResolvedConfig;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub expressions: Vec<ExpressionModel>,
    /// SHA-256 of the canonical JSON of `expressions`; identical graphs compile to the
    /// same fingerprint.
    pub fingerprint: String,
}

pub fn run_compile(graph_text: &str, config: &ResolvedConfig) -> anyhow::Result<CompileOutput> {
    let graph: GraphDocument = serde_json::from_str(graph_text).context("parse graph document")?;
    let expressions = graph
        .compile(&config.engine)
        .context("compile graph")?;
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        expressions = expressions.len(),
        "graph compiled"
    );
    Ok(CompileOutput {
        fingerprint: fingerprint(&expressions),
        expressions,
    })
}
