use std::time::Instant;

use trustgate_types::ids;
use trustgate_types::{
    Decision, Effect, NodeKind, PolicyRef, TraceEntry, TraceOutcome,
};

use crate::error::MalformedExpressionError;
use crate::model::{
    Condition, EvaluationContext, LogicalKind, LogicalNode, Node, PolicyDocument, PolicyStatus,
};
use crate::operators;
use crate::policy::EngineConfig;

/// Stateless evaluator. Cheap to construct and clone; holds only configuration.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    cfg: EngineConfig,
}

impl Evaluator {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Enforcing evaluation. Total: every input yields exactly one decision.
    ///
    /// Documents that are not `active` are refused unless drafts are enabled.
    pub fn evaluate(&self, doc: &PolicyDocument, ctx: &EvaluationContext) -> Decision {
        let started = Instant::now();
        let mut decision = match self.status_refusal(doc) {
            Some(refused) => refused,
            None => self.run(doc, ctx),
        };
        decision.processing_time_ms = elapsed_ms(started);
        decision
    }

    /// What-if evaluation: same walk, no status gate.
    pub fn simulate(&self, doc: &PolicyDocument, ctx: &EvaluationContext) -> Decision {
        let started = Instant::now();
        let mut decision = self.run(doc, ctx);
        decision.processing_time_ms = elapsed_ms(started);
        decision
    }

    fn status_refusal(&self, doc: &PolicyDocument) -> Option<Decision> {
        let allowed = match doc.status {
            PolicyStatus::Active => true,
            PolicyStatus::Draft => self.cfg.evaluate_drafts,
            PolicyStatus::Archived => false,
        };
        if allowed {
            return None;
        }
        let mut decision = Decision::deny(ids::REASON_POLICY_INACTIVE);
        decision.policy = Some(policy_ref(doc));
        decision.trace.push(
            TraceEntry::policy(TraceOutcome::NotEvaluated)
                .with_note(format!("status={}", doc.status)),
        );
        Some(decision)
    }

    fn run(&self, doc: &PolicyDocument, ctx: &EvaluationContext) -> Decision {
        // Stored documents are not trusted: validate everything before walking.
        if let Err(err) = doc.validate(&self.cfg) {
            return malformed(doc, Vec::new(), &err);
        }

        let mut trace = Vec::new();
        let mut effects = Vec::new();
        let mut winner: Option<usize> = None;

        for (index, expr) in doc.expressions.iter().enumerate() {
            if winner.is_some() {
                trace.push(
                    TraceEntry::new(NodeKind::Expression, "-", TraceOutcome::NotEvaluated)
                        .in_expression(index)
                        .with_note(ids::NOTE_EARLIER_MATCH),
                );
                continue;
            }

            let header = trace.len();
            trace.push(
                TraceEntry::new(NodeKind::Expression, "-", TraceOutcome::NotEvaluated)
                    .in_expression(index),
            );

            let mut walk = Walk {
                ctx,
                expression: index,
                trace: &mut trace,
            };
            let matched = match walk.eval(expr.root(), "0") {
                Ok(matched) => matched,
                Err(err) => {
                    trace[header].outcome = TraceOutcome::Error;
                    trace[header].error = Some(err.to_string());
                    return malformed(doc, trace, &err);
                }
            };

            trace[header].outcome = TraceOutcome::from_bool(matched);
            if !matched {
                continue;
            }
            if expr.action().kind.is_terminal() {
                winner = Some(index);
            } else {
                trace[header].note = Some(ids::NOTE_NON_TERMINAL.to_string());
                effects.push(expr.action().clone());
            }
        }

        let mut decision = match winner {
            Some(index) => {
                let action = doc.expressions[index].action().clone();
                Decision {
                    decision: action.kind.effect().unwrap_or(Effect::Deny),
                    reason: ids::REASON_MATCHED.to_string(),
                    matched_expression_index: Some(index),
                    action: Some(action),
                    ..Decision::deny(ids::REASON_MATCHED)
                }
            }
            None => Decision::deny(ids::REASON_NO_MATCH),
        };
        decision.effects = effects;
        decision.policy = Some(policy_ref(doc));
        decision.trace = trace;
        decision
    }
}

/// Deny decision for a document that could not be loaded.
///
/// The lookup layer uses this so that missing or unreachable documents still produce a
/// well-formed, fail-closed decision.
pub fn lookup_failure(reason: &str, detail: impl Into<String>) -> Decision {
    let mut decision = Decision::deny(reason);
    decision
        .trace
        .push(TraceEntry::policy(TraceOutcome::Error).with_error(detail));
    decision
}

fn malformed(
    doc: &PolicyDocument,
    mut trace: Vec<TraceEntry>,
    err: &MalformedExpressionError,
) -> Decision {
    if !trace.iter().any(|t| t.outcome == TraceOutcome::Error) {
        let mut entry = TraceEntry::new(
            NodeKind::Expression,
            err.location.clone(),
            TraceOutcome::Error,
        )
        .with_error(err.to_string());
        entry.expression = err.expression;
        trace.push(entry);
    }
    let mut decision = Decision::deny(ids::REASON_MALFORMED_EXPRESSION);
    decision.policy = Some(policy_ref(doc));
    decision.trace = trace;
    decision
}

fn policy_ref(doc: &PolicyDocument) -> PolicyRef {
    PolicyRef {
        id: doc.id.clone(),
        version: doc.version,
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

struct Walk<'a> {
    ctx: &'a EvaluationContext,
    expression: usize,
    trace: &'a mut Vec<TraceEntry>,
}

impl Walk<'_> {
    fn eval(&mut self, node: &Node, path: &str) -> Result<bool, MalformedExpressionError> {
        match node {
            Node::Constant { value } => {
                self.push(
                    TraceEntry::new(NodeKind::Constant, path, TraceOutcome::from_bool(*value)),
                );
                Ok(*value)
            }
            Node::Condition(cond) => self.condition(cond, path),
            Node::Logical(logical) => self.logical(logical, path),
        }
    }

    fn condition(&mut self, cond: &Condition, path: &str) -> Result<bool, MalformedExpressionError> {
        let mut entry = condition_entry(cond, path, TraceOutcome::False);

        let Some(actual) = self.ctx.resolve(&cond.field) else {
            entry.field_missing = true;
            self.push(entry);
            return Ok(false);
        };

        match operators::apply(cond.operator, &actual, &cond.value) {
            Ok(cmp) => {
                entry.actual = Some(actual.into_owned());
                entry.outcome = TraceOutcome::from_bool(cmp.result);
                entry.note = cmp.note.map(str::to_string);
                self.push(entry);
                Ok(cmp.result)
            }
            Err(reason) => {
                let err = MalformedExpressionError::new(path, reason).in_expression(self.expression);
                entry.actual = Some(actual.into_owned());
                entry.outcome = TraceOutcome::Error;
                entry.error = Some(err.to_string());
                self.push(entry);
                Err(err)
            }
        }
    }

    fn logical(
        &mut self,
        logical: &LogicalNode,
        path: &str,
    ) -> Result<bool, MalformedExpressionError> {
        let slot = self.trace.len();
        let kind = match logical.kind {
            LogicalKind::And => NodeKind::And,
            LogicalKind::Or => NodeKind::Or,
            LogicalKind::Not => NodeKind::Not,
        };
        self.push(TraceEntry::new(kind, path, TraceOutcome::NotEvaluated));

        let result = match logical.kind {
            LogicalKind::Not => {
                let mut value = true;
                for (i, child) in logical.children.iter().enumerate() {
                    value = !self.eval(child, &child_path(path, i))?;
                }
                value
            }
            LogicalKind::And | LogicalKind::Or => {
                // AND stops on the first false, OR on the first true.
                let decisive = logical.kind == LogicalKind::Or;
                let mut result = !decisive;
                for (i, child) in logical.children.iter().enumerate() {
                    let child_path = child_path(path, i);
                    if result == decisive {
                        self.skip(child, &child_path);
                        continue;
                    }
                    if self.eval(child, &child_path)? == decisive {
                        result = decisive;
                    }
                }
                result
            }
        };

        self.trace[slot].outcome = TraceOutcome::from_bool(result);
        Ok(result)
    }

    fn skip(&mut self, node: &Node, path: &str) {
        let entry = match node {
            Node::Condition(cond) => condition_entry(cond, path, TraceOutcome::NotEvaluated),
            Node::Constant { .. } => {
                TraceEntry::new(NodeKind::Constant, path, TraceOutcome::NotEvaluated)
            }
            Node::Logical(l) => {
                let kind = match l.kind {
                    LogicalKind::And => NodeKind::And,
                    LogicalKind::Or => NodeKind::Or,
                    LogicalKind::Not => NodeKind::Not,
                };
                TraceEntry::new(kind, path, TraceOutcome::NotEvaluated)
            }
        };
        self.push(entry.with_note(ids::NOTE_SHORT_CIRCUIT));
    }

    fn push(&mut self, entry: TraceEntry) {
        self.trace.push(entry.in_expression(self.expression));
    }
}

fn condition_entry(cond: &Condition, path: &str, outcome: TraceOutcome) -> TraceEntry {
    let mut entry = TraceEntry::new(NodeKind::Condition, path, outcome);
    entry.field = Some(cond.field.to_string());
    entry.operator = Some(cond.operator.as_str().to_string());
    if !cond.value.is_null() {
        entry.expected = Some(cond.value.clone());
    }
    entry
}

fn child_path(parent: &str, index: usize) -> String {
    format!("{parent}.{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;
    use crate::test_support::{active_policy, context, expr};
    use serde_json::json;
    use trustgate_types::ActionKind;

    fn verified_policy() -> PolicyDocument {
        active_policy(
            "trust-gate",
            vec![expr(
                Node::condition(
                    "subject.trustLevel",
                    Operator::GreaterThanOrEqual,
                    json!("VERIFIED"),
                ),
                ActionKind::Allow,
            )],
        )
    }

    #[test]
    fn trust_level_gate_end_to_end() {
        let eval = Evaluator::default();
        let doc = verified_policy();

        let ok = eval.evaluate(&doc, &context(json!({ "trustLevel": "VERIFIED" })));
        assert_eq!(ok.decision, Effect::Allow);
        assert_eq!(ok.matched_expression_index, Some(0));
        assert_eq!(ok.reason, ids::REASON_MATCHED);

        let low = eval.evaluate(&doc, &context(json!({ "trustLevel": "BASIC" })));
        assert_eq!(low.decision, Effect::Deny);
        assert_eq!(low.matched_expression_index, None);
        assert_eq!(low.reason, ids::REASON_NO_MATCH);
    }

    #[test]
    fn first_match_wins_and_later_expressions_are_not_evaluated() {
        let doc = active_policy(
            "order",
            vec![
                expr(Node::constant(true), ActionKind::Deny),
                expr(Node::constant(true), ActionKind::Allow),
            ],
        );
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        assert_eq!(d.matched_expression_index, Some(0));

        let last = d.trace.last().expect("trace");
        assert_eq!(last.expression, Some(1));
        assert_eq!(last.outcome, TraceOutcome::NotEvaluated);
        assert_eq!(last.note.as_deref(), Some(ids::NOTE_EARLIER_MATCH));
    }

    #[test]
    fn and_short_circuits_on_false() {
        let doc = active_policy(
            "short",
            vec![expr(
                Node::and(vec![
                    Node::condition("subject.role", Operator::Equals, json!("admin")),
                    Node::condition("subject.mfa", Operator::Exists, json!(null)),
                ]),
                ActionKind::Allow,
            )],
        );
        let d = Evaluator::default().evaluate(&doc, &context(json!({ "role": "guest", "mfa": true })));
        assert_eq!(d.decision, Effect::Deny);

        let skipped = d.trace.iter().find(|t| t.path == "0.1").expect("second child traced");
        assert_eq!(skipped.outcome, TraceOutcome::NotEvaluated);
        assert_eq!(skipped.note.as_deref(), Some(ids::NOTE_SHORT_CIRCUIT));

        let and = d.trace.iter().find(|t| t.path == "0").expect("root traced");
        assert_eq!(and.node, NodeKind::And);
        assert_eq!(and.outcome, TraceOutcome::False);
    }

    #[test]
    fn or_short_circuits_on_true() {
        let doc = active_policy(
            "or",
            vec![expr(
                Node::or(vec![Node::constant(true), Node::constant(false)]),
                ActionKind::Allow,
            )],
        );
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert!(d.is_allowed());
        let skipped = d.trace.iter().find(|t| t.path == "0.1").expect("traced");
        assert_eq!(skipped.outcome, TraceOutcome::NotEvaluated);
    }

    #[test]
    fn not_negates() {
        let doc = active_policy(
            "not",
            vec![expr(
                Node::not(Node::condition("subject.banned", Operator::Equals, json!(true))),
                ActionKind::Allow,
            )],
        );
        let eval = Evaluator::default();
        assert!(eval.evaluate(&doc, &context(json!({ "banned": false }))).is_allowed());
        assert!(!eval.evaluate(&doc, &context(json!({ "banned": true }))).is_allowed());
    }

    #[test]
    fn missing_field_is_false_and_flagged() {
        let d = Evaluator::default().evaluate(&verified_policy(), &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        let cond = d
            .trace
            .iter()
            .find(|t| t.node == NodeKind::Condition)
            .expect("condition traced");
        assert!(cond.field_missing);
        assert_eq!(cond.outcome, TraceOutcome::False);
        assert!(cond.error.is_none());
    }

    #[test]
    fn incomparable_operands_are_noted() {
        let d = Evaluator::default().evaluate(&verified_policy(), &context(json!({ "trustLevel": 3 })));
        assert_eq!(d.decision, Effect::Deny);
        let cond = d
            .trace
            .iter()
            .find(|t| t.node == NodeKind::Condition)
            .expect("condition traced");
        assert_eq!(cond.note.as_deref(), Some(ids::NOTE_INCOMPARABLE));
    }

    #[test]
    fn non_terminal_actions_accumulate_effects() {
        let doc = active_policy(
            "effects",
            vec![
                expr(Node::constant(true), ActionKind::Log),
                expr(Node::constant(true), ActionKind::Alert),
                expr(Node::constant(true), ActionKind::Throttle),
            ],
        );
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Throttle);
        assert_eq!(d.matched_expression_index, Some(2));
        let kinds: Vec<_> = d.effects.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Log, ActionKind::Alert]);
    }

    #[test]
    fn only_non_terminal_matches_still_deny() {
        let doc = active_policy("log-only", vec![expr(Node::constant(true), ActionKind::Log)]);
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        assert_eq!(d.reason, ids::REASON_NO_MATCH);
        assert_eq!(d.effects.len(), 1);
    }

    #[test]
    fn require_approval_denies_but_reports_action() {
        let doc = active_policy(
            "approval",
            vec![expr(Node::constant(true), ActionKind::RequireApproval)],
        );
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        assert_eq!(d.reason, ids::REASON_MATCHED);
        assert_eq!(
            d.action.map(|a| a.kind),
            Some(ActionKind::RequireApproval)
        );
    }

    #[test]
    fn malformed_document_denies_with_error_entry() {
        let mut doc = verified_policy();
        doc.expressions = serde_json::from_value(json!([
            { "root": { "type": "logical", "kind": "AND", "children": [] },
              "action": { "kind": "allow" } }
        ]))
        .expect("raw expressions");

        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        assert_eq!(d.reason, ids::REASON_MALFORMED_EXPRESSION);
        let err = d.trace.last().expect("error entry");
        assert_eq!(err.outcome, TraceOutcome::Error);
        assert_eq!(err.expression, Some(0));
        assert!(err.error.as_deref().unwrap_or("").contains("no children"));
    }

    #[test]
    fn draft_and_archived_are_refused_unless_enabled() {
        let mut doc = verified_policy();
        let ctx = context(json!({ "trustLevel": "TRUSTED" }));

        doc.status = PolicyStatus::Draft;
        let d = Evaluator::default().evaluate(&doc, &ctx);
        assert_eq!(d.reason, ids::REASON_POLICY_INACTIVE);
        assert_eq!(d.decision, Effect::Deny);

        let drafts = Evaluator::new(EngineConfig {
            evaluate_drafts: true,
            ..EngineConfig::default()
        });
        assert!(drafts.evaluate(&doc, &ctx).is_allowed());

        doc.status = PolicyStatus::Archived;
        assert_eq!(drafts.evaluate(&doc, &ctx).reason, ids::REASON_POLICY_INACTIVE);
        assert!(Evaluator::default().simulate(&doc, &ctx).is_allowed());
    }

    #[test]
    fn empty_document_denies() {
        let doc = active_policy("empty", vec![]);
        let d = Evaluator::default().evaluate(&doc, &context(json!({})));
        assert_eq!(d.decision, Effect::Deny);
        assert!(d.trace.is_empty());
        assert_eq!(
            d.policy,
            Some(PolicyRef {
                id: "empty".into(),
                version: 1
            })
        );
    }

    #[test]
    fn lookup_failure_is_a_traced_deny() {
        let d = lookup_failure(ids::REASON_POLICY_NOT_FOUND, "policy 'x' not found");
        assert_eq!(d.decision, Effect::Deny);
        assert_eq!(d.trace[0].node, NodeKind::Policy);
        assert_eq!(d.trace[0].error.as_deref(), Some("policy 'x' not found"));
    }
}
