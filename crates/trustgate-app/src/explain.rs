//! The `explain` use case.
//!
//! Reason codes print their registry entry. Operators additionally run the entry's
//! example condition through the evaluator, so the printed outcome is what the engine
//! actually decides for that context.

use serde_json::Value as JsonValue;
use trustgate_domain::{
    EvaluationContext, Evaluator, ExpressionModel, Node, Operator, PolicyDocument, PolicyStatus,
    TrustLevel,
};
use trustgate_types::explain::{self, Explanation};
use trustgate_types::{Action, ActionKind, Decision, NodeKind, TraceOutcome};

#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Reason(Explanation),
    Operator {
        operator: Operator,
        explanation: Explanation,
        /// Decision for the example condition guarding an `allow`, if the example parses.
        example: Option<Decision>,
    },
    NotFound {
        identifier: String,
        suggestions: Vec<&'static str>,
    },
}

impl ExplainOutput {
    pub fn is_found(&self) -> bool {
        !matches!(self, ExplainOutput::NotFound { .. })
    }
}

/// Look up a reason code or operator name.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    let Some(explanation) = explain::lookup_explanation(identifier) else {
        return ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            suggestions: suggestions(identifier),
        };
    };
    match serde_json::from_value::<Operator>(JsonValue::String(identifier.to_string())) {
        Ok(operator) => {
            let example = evaluate_example(&explanation);
            ExplainOutput::Operator {
                operator,
                explanation,
                example,
            }
        }
        Err(_) => ExplainOutput::Reason(explanation),
    }
}

fn evaluate_example(exp: &Explanation) -> Option<Decision> {
    let root: Node = serde_json::from_str(exp.examples.condition).ok()?;
    let ctx: EvaluationContext = serde_json::from_str(exp.examples.context).ok()?;
    let expr = ExpressionModel::new(root, Action::new(ActionKind::Allow)).ok()?;
    let mut doc: PolicyDocument =
        serde_json::from_value(serde_json::json!({ "id": "example", "name": "example" })).ok()?;
    doc.status = PolicyStatus::Active;
    doc.expressions = vec![expr];
    Some(Evaluator::default().evaluate(&doc, &ctx))
}

/// Known identifiers that contain the input or are contained by it, ignoring case.
fn suggestions(identifier: &str) -> Vec<&'static str> {
    let needle = identifier.trim().to_ascii_lowercase();
    if needle.len() < 2 {
        return Vec::new();
    }
    explain::all_reasons()
        .iter()
        .chain(explain::all_operators())
        .copied()
        .filter(|known| {
            let known = known.to_ascii_lowercase();
            known.contains(&needle) || needle.contains(&known)
        })
        .collect()
}

/// Terminal rendering of any explain outcome.
pub fn format_explain(output: &ExplainOutput) -> String {
    match output {
        ExplainOutput::Reason(exp) => {
            let mut out = header(exp);
            out.push_str(&format!(
                "Example\n  condition: {}\n  context:   {}\n",
                exp.examples.condition, exp.examples.context
            ));
            out
        }
        ExplainOutput::Operator {
            operator,
            explanation,
            example,
        } => {
            let mut out = header(explanation);
            if operator.is_ordering() {
                let order: Vec<&str> = TrustLevel::ALL.iter().map(|l| l.as_str()).collect();
                out.push_str(&format!("Trust order: {}\n\n", order.join(" < ")));
            }
            out.push_str(&format!(
                "Example\n  condition: {}\n  context:   {}\n",
                explanation.examples.condition,
                explanation.examples.context
            ));
            if let Some(decision) = example {
                out.push_str(&example_outcome(decision));
            }
            out
        }
        ExplainOutput::NotFound {
            identifier,
            suggestions,
        } => {
            let mut out = format!("Unknown reason or operator '{identifier}'.\n");
            if !suggestions.is_empty() {
                out.push_str(&format!("Did you mean: {}?\n", suggestions.join(", ")));
            }
            out.push_str(&format!(
                "\nReasons:   {}\nOperators: {}\n",
                explain::all_reasons().join(", "),
                explain::all_operators().join(", ")
            ));
            out
        }
    }
}

fn header(exp: &Explanation) -> String {
    format!(
        "{}\n{}\n\n{}\n\nRemediation: {}\n\n",
        exp.title,
        "=".repeat(exp.title.len()),
        exp.description,
        exp.remediation
    )
}

fn example_outcome(decision: &Decision) -> String {
    let mut out = format!(
        "  outcome:   {} ({})\n",
        decision.decision.as_str(),
        decision.reason
    );
    let condition = decision
        .trace
        .iter()
        .find(|entry| entry.node == NodeKind::Condition);
    if let Some(entry) = condition {
        let actual = match &entry.actual {
            Some(value) => value.to_string(),
            None if entry.field_missing => "field missing".to_string(),
            None => "-".to_string(),
        };
        let outcome = match entry.outcome {
            TraceOutcome::True => "true",
            TraceOutcome::False => "false",
            TraceOutcome::NotEvaluated => "not evaluated",
            TraceOutcome::Error => "error",
        };
        out.push_str(&format!("  evaluated: {outcome} with actual {actual}\n"));
    }
    out
}
