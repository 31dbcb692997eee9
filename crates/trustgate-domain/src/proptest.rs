//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Normalization idempotence and semantic preservation
//! - Evaluation totality over arbitrary contexts
//! - Canonical JSON stability

use crate::engine::Evaluator;
use crate::fingerprint::canonical_json;
use crate::model::{EvaluationContext, Node, Operator};
use crate::normalize::normalize;
use crate::test_support::{active_policy, expr};
use proptest::prelude::*;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use trustgate_types::{ActionKind, Effect, ids};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Field paths drawn from a small vocabulary so that generated conditions
/// actually hit generated context keys.
fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("subject.trustLevel".to_string()),
        Just("subject.role".to_string()),
        Just("subject.score".to_string()),
        Just("subject.tags".to_string()),
        Just("resource.path".to_string()),
        Just("environment.region".to_string()),
        Just("action".to_string()),
    ]
}

fn arb_scalar() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::from),
        (-100i64..100).prop_map(JsonValue::from),
        (-100.0f64..100.0).prop_map(JsonValue::from),
        prop_oneof![
            Just("VERIFIED"),
            Just("basic"),
            Just("admin"),
            Just("/docs/a.pdf"),
            Just("eu-west"),
            Just(""),
        ]
        .prop_map(JsonValue::from),
    ]
}

/// Arbitrary JSON, bounded in depth and width.
fn arb_json() -> impl Strategy<Value = JsonValue> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
        ]
    })
}

/// Conditions whose value always passes validation for the chosen operator.
fn arb_condition() -> impl Strategy<Value = Node> {
    let ordering = prop_oneof![
        Just(Operator::GreaterThan),
        Just(Operator::GreaterThanOrEqual),
        Just(Operator::LessThan),
        Just(Operator::LessThanOrEqual),
    ];
    let ordered_value = prop_oneof![
        (-100i64..100).prop_map(JsonValue::from),
        prop_oneof![Just("UNKNOWN"), Just("basic"), Just("Verified"), Just("PRIVILEGED")]
            .prop_map(JsonValue::from),
    ];

    prop_oneof![
        (arb_field(), arb_scalar())
            .prop_map(|(f, v)| Node::condition(&f, Operator::Equals, v)),
        (arb_field(), arb_scalar())
            .prop_map(|(f, v)| Node::condition(&f, Operator::NotEquals, v)),
        (arb_field(), prop::collection::vec(arb_scalar(), 0..4))
            .prop_map(|(f, v)| Node::condition(&f, Operator::In, JsonValue::Array(v))),
        (arb_field(), prop::collection::vec(arb_scalar(), 0..4))
            .prop_map(|(f, v)| Node::condition(&f, Operator::NotIn, JsonValue::Array(v))),
        (arb_field(), ordering, ordered_value).prop_map(|(f, op, v)| Node::condition(&f, op, v)),
        (arb_field(), arb_scalar())
            .prop_map(|(f, v)| Node::condition(&f, Operator::Contains, v)),
        (arb_field(), prop_oneof![Just("/docs/*"), Just("*-west"), Just("{eu,us}-*")])
            .prop_map(|(f, p)| Node::condition(&f, Operator::Matches, json!(p))),
        arb_field().prop_map(|f| Node::condition(&f, Operator::Exists, JsonValue::Null)),
    ]
}

/// Valid expression trees: AND/OR with at least one child, NOT with exactly one.
fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        4 => arb_condition(),
        1 => any::<bool>().prop_map(Node::constant),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Node::and),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Node::or),
            inner.prop_map(Node::not),
        ]
    })
}

fn arb_section() -> impl Strategy<Value = BTreeMap<String, JsonValue>> {
    prop::collection::btree_map(
        prop_oneof![
            Just("trustLevel".to_string()),
            Just("role".to_string()),
            Just("score".to_string()),
            Just("tags".to_string()),
            Just("path".to_string()),
            Just("region".to_string()),
            "[a-z]{1,5}",
        ],
        arb_json(),
        0..6,
    )
}

fn arb_context() -> impl Strategy<Value = EvaluationContext> {
    (
        arb_section(),
        arb_section(),
        arb_section(),
        "[a-z]{0,8}",
        proptest::option::of("[a-z]{1,6}"),
    )
        .prop_map(
            |(subject, resource, environment, action, organization_id)| EvaluationContext {
                subject,
                resource,
                action,
                environment,
                organization_id,
            },
        )
}

fn arb_action() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        Just(ActionKind::Allow),
        Just(ActionKind::Deny),
        Just(ActionKind::Throttle),
        Just(ActionKind::Log),
        Just(ActionKind::Alert),
        Just(ActionKind::RequireApproval),
    ]
}

// ============================================================================
// Normalization
// ============================================================================

proptest! {
    /// Normalizing twice is the same as normalizing once.
    #[test]
    fn normalize_is_idempotent(node in arb_node()) {
        let once = normalize(node);
        let twice = normalize(once.clone());
        prop_assert_eq!(canonical_json(&once), canonical_json(&twice));
    }

    /// Normalization never changes what an expression evaluates to.
    #[test]
    fn normalize_preserves_truth(node in arb_node(), ctx in arb_context()) {
        let eval = Evaluator::default();
        let original = active_policy("p", vec![expr(node.clone(), ActionKind::Allow)]);
        let normalized = active_policy("p", vec![expr(normalize(node), ActionKind::Allow)]);

        prop_assert_eq!(
            eval.evaluate(&original, &ctx).decision,
            eval.evaluate(&normalized, &ctx).decision
        );
    }

    /// Normalized trees never get deeper.
    #[test]
    fn normalize_never_deepens(node in arb_node()) {
        let depth = node.depth();
        prop_assert!(normalize(node).depth() <= depth);
    }
}

// ============================================================================
// Evaluation totality
// ============================================================================

proptest! {
    /// Every (document, context) pair yields exactly one well-formed decision.
    #[test]
    fn evaluation_is_total(
        exprs in prop::collection::vec((arb_node(), arb_action()), 0..5),
        ctx in arb_context(),
    ) {
        let doc = active_policy(
            "p",
            exprs.into_iter().map(|(n, a)| expr(n, a)).collect(),
        );
        let decision = Evaluator::default().evaluate(&doc, &ctx);

        match decision.matched_expression_index {
            Some(i) => {
                prop_assert_eq!(decision.reason.as_str(), ids::REASON_MATCHED);
                prop_assert!(i < doc.expressions.len());
                prop_assert!(doc.expressions[i].action().kind.is_terminal());
            }
            None => {
                prop_assert_eq!(decision.decision, Effect::Deny);
                prop_assert_eq!(decision.reason.as_str(), ids::REASON_NO_MATCH);
            }
        }
        prop_assert!(decision.trace.iter().all(|t| t.error.is_none()));
        prop_assert!(decision.processing_time_ms >= 0.0);
    }

    /// Arbitrary JSON deserialized as a document never panics the evaluator.
    #[test]
    fn arbitrary_documents_fail_closed(raw in arb_json(), ctx in arb_context()) {
        let doc = serde_json::from_value::<crate::model::PolicyDocument>(json!({
            "id": "fuzz",
            "status": "active",
            "expressions": [{ "root": raw, "action": { "kind": "allow" } }]
        }));
        if let Ok(doc) = doc {
            let decision = Evaluator::default().evaluate(&doc, &ctx);
            if decision.matched_expression_index.is_none() {
                prop_assert_eq!(decision.decision, Effect::Deny);
            }
        }
    }
}

// ============================================================================
// Canonical JSON
// ============================================================================

proptest! {
    /// Canonical JSON round-trips through serde and is stable.
    #[test]
    fn canonical_json_is_stable(value in arb_json()) {
        let text = canonical_json(&value);
        let reparsed: JsonValue = serde_json::from_str(&text).expect("canonical json parses");
        prop_assert_eq!(canonical_json(&reparsed), text);
    }
}
