use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use camino::Utf8Path;
use time::OffsetDateTime;
use trustgate_domain::{PolicyDocument, PolicyStatus};
use trustgate_types::Decision;

use crate::discover::load_policy_dir;
use crate::store::{
    AuditOperation, AuditRecord, EvaluationRecord, NewPolicy, PolicyFilter, PolicyPage,
    PolicyPatch, PolicyStore, StoreError,
};

#[derive(Default)]
struct Inner {
    policies: BTreeMap<String, PolicyDocument>,
    audit: Vec<AuditRecord>,
}

/// Default number of evaluation records a [`MemoryStore`] retains.
pub const EVALUATION_LOG_CAPACITY: usize = 10_000;

/// In-process policy store.
///
/// Documents are kept in id order, so searches are deterministic. `set_offline` makes
/// every call fail with [`StoreError::Unavailable`], which is how outages are exercised.
///
/// Evaluation records live behind their own lock in a ring of bounded size; recording
/// never contends with document reads.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    evaluations: Mutex<VecDeque<EvaluationRecord>>,
    evaluation_capacity: usize,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::default(),
            evaluations: Mutex::default(),
            evaluation_capacity: EVALUATION_LOG_CAPACITY,
            next_id: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Keep at most `capacity` evaluation records, dropping the oldest first.
    pub fn with_evaluation_capacity(mut self, capacity: usize) -> Self {
        self.evaluation_capacity = capacity;
        self
    }

    /// Seed with documents as-is (no version bump, no audit record).
    pub fn with_policies(policies: impl IntoIterator<Item = PolicyDocument>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.write() {
            for doc in policies {
                inner.policies.insert(doc.id.clone(), doc);
            }
        }
        store
    }

    /// Seed from every `*.json` document under `dir`.
    pub fn load_dir(dir: &Utf8Path) -> anyhow::Result<Self> {
        Ok(Self::with_policies(load_policy_dir(dir)?))
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn audit_log(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.read()?.audit.clone())
    }

    /// Retained evaluation records, oldest first.
    pub fn evaluations(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        self.check_online()?;
        let log = self
            .evaluations
            .lock()
            .map_err(|_| StoreError::Unavailable("evaluation log lock poisoned".to_string()))?;
        Ok(log.iter().cloned().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.check_online()?;
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.check_online()?;
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn fresh_id(&self, inner: &Inner) -> String {
        loop {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            let id = format!("pol-{n:06}");
            if !inner.policies.contains_key(&id) {
                return id;
            }
        }
    }
}

fn audit(
    doc: &PolicyDocument,
    actor: &str,
    operation: AuditOperation,
    reason: Option<&str>,
) -> AuditRecord {
    AuditRecord {
        policy_id: doc.id.clone(),
        version: doc.version,
        actor: actor.to_string(),
        operation,
        reason: reason.map(str::to_string),
        at: doc.updated_at,
    }
}

impl PolicyStore for MemoryStore {
    fn get_policy(
        &self,
        id: &str,
        organization_id: Option<&str>,
    ) -> Result<PolicyDocument, StoreError> {
        let inner = self.read()?;
        inner
            .policies
            .get(id)
            .filter(|doc| organization_id.is_none() || doc.visible_to(organization_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn search_policies(&self, filter: &PolicyFilter) -> Result<PolicyPage, StoreError> {
        let inner = self.read()?;
        let matching: Vec<&PolicyDocument> = inner
            .policies
            .values()
            .filter(|doc| filter.matches(doc))
            .collect();
        let total = matching.len();
        let policies = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect();
        Ok(PolicyPage { policies, total })
    }

    fn create_policy(&self, policy: NewPolicy, created_by: &str) -> Result<String, StoreError> {
        if policy.name.trim().is_empty() {
            return Err(StoreError::Invalid("policy name must not be empty".to_string()));
        }

        let mut inner = self.write()?;
        let id = self.fresh_id(&inner);
        let doc = PolicyDocument {
            id: id.clone(),
            name: policy.name,
            description: policy.description,
            organization_id: policy.organization_id,
            version: 1,
            status: PolicyStatus::Draft,
            expressions: policy.expressions,
            created_by: created_by.to_string(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let record = audit(&doc, created_by, AuditOperation::Create, None);
        inner.policies.insert(id.clone(), doc);
        inner.audit.push(record);
        tracing::debug!(policy_id = %id, "policy created");
        Ok(id)
    }

    fn update_policy(
        &self,
        id: &str,
        patch: PolicyPatch,
        updated_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, StoreError> {
        let mut inner = self.write()?;
        let operation = if patch.is_publish() {
            AuditOperation::Publish
        } else {
            AuditOperation::Update
        };

        let doc = inner
            .policies
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if doc.version != patch.expected_version {
            return Err(StoreError::VersionConflict {
                id: id.to_string(),
                expected: patch.expected_version,
                actual: doc.version,
            });
        }
        if doc.status == PolicyStatus::Archived {
            return Err(StoreError::Invalid(format!("policy '{id}' is archived")));
        }

        if let Some(name) = patch.name {
            doc.name = name;
        }
        if let Some(description) = patch.description {
            doc.description = description;
        }
        if let Some(expressions) = patch.expressions {
            doc.expressions = expressions;
        }
        if let Some(status) = patch.status {
            doc.status = status;
        }
        doc.version += 1;
        doc.updated_at = OffsetDateTime::now_utc();

        let updated = doc.clone();
        inner
            .audit
            .push(audit(&updated, updated_by, operation, reason));
        Ok(updated)
    }

    fn delete_policy(
        &self,
        id: &str,
        deleted_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, StoreError> {
        let mut inner = self.write()?;
        let doc = inner
            .policies
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if doc.status == PolicyStatus::Archived {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        doc.status = PolicyStatus::Archived;
        doc.version += 1;
        doc.updated_at = OffsetDateTime::now_utc();

        let archived = doc.clone();
        inner
            .audit
            .push(audit(&archived, deleted_by, AuditOperation::Delete, reason));
        Ok(archived)
    }

    fn record_evaluation(&self, policy_id: &str, decision: &Decision) -> Result<(), StoreError> {
        self.check_online()?;
        if self.evaluation_capacity == 0 {
            return Ok(());
        }
        let record = EvaluationRecord::from_decision(policy_id, decision);
        let mut log = self
            .evaluations
            .lock()
            .map_err(|_| StoreError::Unavailable("evaluation log lock poisoned".to_string()))?;
        while log.len() >= self.evaluation_capacity {
            log.pop_front();
        }
        log.push_back(record);
        Ok(())
    }
}
