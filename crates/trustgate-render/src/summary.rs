use trustgate_types::Decision;

/// One line suitable for stderr or a log sink.
///
/// Format:
/// `{decision} reason={reason} [policy={id}@v{version}] [expression={index}] [effects={a,b}]`
pub fn render_summary(decision: &Decision) -> String {
    let mut out = format!(
        "{} reason={}",
        decision.decision.as_str(),
        decision.reason
    );
    if let Some(policy) = &decision.policy {
        out.push_str(&format!(" policy={}@v{}", policy.id, policy.version));
    }
    if let Some(index) = decision.matched_expression_index {
        out.push_str(&format!(" expression={}", index));
    }
    if !decision.effects.is_empty() {
        let effects: Vec<&str> = decision.effects.iter().map(|a| a.kind.as_str()).collect();
        out.push_str(&format!(" effects={}", effects.join(",")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustgate_types::{Action, ActionKind, Effect, PolicyRef};

    #[test]
    fn bare_deny() {
        let decision = Decision::deny("policy_not_found");
        assert_eq!(render_summary(&decision), "deny reason=policy_not_found");
    }

    #[test]
    fn matched_allow_with_effects() {
        let mut decision = Decision::deny("matched");
        decision.decision = Effect::Allow;
        decision.matched_expression_index = Some(2);
        decision.policy = Some(PolicyRef {
            id: "trust-gate".to_string(),
            version: 4,
        });
        decision.effects = vec![Action::new(ActionKind::Log), Action::new(ActionKind::Alert)];

        assert_eq!(
            render_summary(&decision),
            "allow reason=matched policy=trust-gate@v4 expression=2 effects=log,alert"
        );
    }
}
