use trustgate_types::{Decision, NodeKind, TraceEntry, TraceOutcome};

pub fn render_markdown(decision: &Decision) -> String {
    let mut out = String::new();

    out.push_str("# Trustgate decision\n\n");
    out.push_str(&format!(
        "- Decision: **{}**\n- Reason: `{}`\n",
        decision.decision.as_str().to_uppercase(),
        decision.reason
    ));
    if let Some(policy) = &decision.policy {
        out.push_str(&format!("- Policy: `{}` v{}\n", policy.id, policy.version));
    }
    if let Some(index) = decision.matched_expression_index {
        out.push_str(&format!("- Matched expression: {}\n", index));
    }
    if let Some(action) = &decision.action {
        out.push_str(&format!("- Action: `{}`\n", action.kind.as_str()));
    }
    if !decision.effects.is_empty() {
        let effects: Vec<String> = decision
            .effects
            .iter()
            .map(|a| format!("`{}`", a.kind.as_str()))
            .collect();
        out.push_str(&format!("- Effects: {}\n", effects.join(", ")));
    }
    out.push('\n');

    if decision.trace.is_empty() {
        out.push_str("No trace.\n");
        return out;
    }

    out.push_str("## Trace\n\n");
    out.push_str("| Expr | Path | Node | Detail | Outcome |\n");
    out.push_str("|---|---|---|---|---|\n");
    for entry in &decision.trace {
        let expr = entry
            .expression
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            expr,
            entry.path,
            node_label(entry.node),
            escape_cell(&detail(entry)),
            outcome_label(entry.outcome)
        ));
    }

    out
}

fn node_label(node: NodeKind) -> &'static str {
    match node {
        NodeKind::Policy => "policy",
        NodeKind::Expression => "expression",
        NodeKind::And => "AND",
        NodeKind::Or => "OR",
        NodeKind::Not => "NOT",
        NodeKind::Condition => "condition",
        NodeKind::Constant => "constant",
    }
}

fn outcome_label(outcome: TraceOutcome) -> &'static str {
    match outcome {
        TraceOutcome::True => "true",
        TraceOutcome::False => "false",
        TraceOutcome::NotEvaluated => "not evaluated",
        TraceOutcome::Error => "**error**",
    }
}

fn detail(entry: &TraceEntry) -> String {
    let mut parts = Vec::new();

    if let Some(field) = &entry.field {
        let mut cond = format!("`{}`", field);
        if let Some(op) = &entry.operator {
            cond.push_str(&format!(" {}", op));
        }
        if let Some(expected) = &entry.expected {
            cond.push_str(&format!(" `{}`", compact(expected)));
        }
        parts.push(cond);
    }
    if entry.field_missing {
        parts.push("field missing".to_string());
    } else if let Some(actual) = &entry.actual {
        parts.push(format!("actual `{}`", compact(actual)));
    }
    if let Some(note) = &entry.note {
        parts.push(format!("note: {}", note));
    }
    if let Some(error) = &entry.error {
        parts.push(format!("error: {}", error));
    }

    parts.join("; ")
}

fn compact(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
