use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use trustgate_domain::{ExpressionModel, PolicyDocument, PolicyStatus};
use trustgate_types::{Decision, Effect};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("policy '{id}' not found")]
    NotFound { id: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("version conflict on policy '{id}': expected {expected}, found {actual}")]
    VersionConflict { id: String, expected: u32, actual: u32 },
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Search criteria. Serialized (canonically) to derive the list cache key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PolicyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for PolicyFilter {
    fn default() -> Self {
        Self {
            organization_id: None,
            status: None,
            name_contains: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl PolicyFilter {
    pub fn matches(&self, doc: &PolicyDocument) -> bool {
        let in_scope = self
            .organization_id
            .as_deref()
            .is_none_or(|org| doc.visible_to(Some(org)));
        let status_ok = self.status.is_none_or(|status| doc.status == status);
        let name_ok = self.name_contains.as_deref().is_none_or(|needle| {
            doc.name.to_lowercase().contains(&needle.to_lowercase())
        });
        in_scope && status_ok && name_ok
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyPage {
    pub policies: Vec<PolicyDocument>,
    /// Matches before pagination.
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPolicy {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub expressions: Vec<ExpressionModel>,
}

/// Partial update guarded by an optimistic version check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPatch {
    pub expected_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expressions: Option<Vec<ExpressionModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PolicyStatus>,
}

impl PolicyPatch {
    /// A patch that only moves the document to `active`.
    pub fn is_publish(&self) -> bool {
        self.status == Some(PolicyStatus::Active)
            && self.name.is_none()
            && self.description.is_none()
            && self.expressions.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Create,
    Update,
    Publish,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub policy_id: String,
    pub version: u32,
    pub actor: String,
    pub operation: AuditOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub policy_id: String,
    pub decision: Effect,
    pub reason: String,
    pub matched_expression_index: Option<usize>,
    pub processing_time_ms: f64,
}

impl EvaluationRecord {
    pub fn from_decision(policy_id: &str, decision: &Decision) -> Self {
        Self {
            policy_id: policy_id.to_string(),
            decision: decision.decision,
            reason: decision.reason.clone(),
            matched_expression_index: decision.matched_expression_index,
            processing_time_ms: decision.processing_time_ms,
        }
    }
}

/// Persistence for policy documents.
///
/// Mutations bump `version` and append an audit record. Deletion is a soft delete to
/// `archived`. Implementations must be shareable across threads.
pub trait PolicyStore: Send + Sync {
    /// Fetch a document visible to the given organization scope.
    ///
    /// `None` is an administrative read and ignores ownership; callers enforcing a
    /// tenant boundary check [`PolicyDocument::visible_to`] themselves.
    fn get_policy(
        &self,
        id: &str,
        organization_id: Option<&str>,
    ) -> Result<PolicyDocument, StoreError>;

    fn search_policies(&self, filter: &PolicyFilter) -> Result<PolicyPage, StoreError>;

    /// Store a new `draft` document and return its id.
    fn create_policy(&self, policy: NewPolicy, created_by: &str) -> Result<String, StoreError>;

    fn update_policy(
        &self,
        id: &str,
        patch: PolicyPatch,
        updated_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, StoreError>;

    fn delete_policy(
        &self,
        id: &str,
        deleted_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, StoreError>;

    fn record_evaluation(&self, policy_id: &str, decision: &Decision) -> Result<(), StoreError>;
}
