//! Builders shared by the domain's unit and property tests.

use crate::model::{EvaluationContext, ExpressionModel, Node, PolicyDocument, PolicyStatus};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use trustgate_types::{Action, ActionKind};

pub fn expr(root: Node, kind: ActionKind) -> ExpressionModel {
    ExpressionModel::new(root, Action::new(kind)).expect("valid test expression")
}

pub fn active_policy(id: &str, expressions: Vec<ExpressionModel>) -> PolicyDocument {
    PolicyDocument {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        organization_id: None,
        version: 1,
        status: PolicyStatus::Active,
        expressions,
        created_by: "test".to_string(),
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

/// Context whose `subject` map is the given JSON object.
pub fn context(subject: JsonValue) -> EvaluationContext {
    let subject = match subject {
        JsonValue::Object(map) => map.into_iter().collect(),
        _ => Default::default(),
    };
    EvaluationContext {
        subject,
        action: "read".to_string(),
        ..EvaluationContext::default()
    }
}
