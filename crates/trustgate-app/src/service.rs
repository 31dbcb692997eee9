//! The policy service: storage, cache and the pure evaluator behind one facade.
//!
//! Evaluation is total. Lookup failures (missing document, archived document, storage
//! outage) become deny decisions. Construction and mutation paths return
//! [`ServiceError`] instead, and every successful mutation invalidates the cached
//! document, its cached decisions and all cached search pages.
//!
//! Cache fills go through a [`Fence`]: a read that started before an invalidation never
//! writes its (possibly stale) result back, so once a mutation returns no later call
//! observes the previous version.

use std::sync::Arc;
use std::time::Instant;

use time::OffsetDateTime;
use trustgate_cache::keys::{self, LIST_PATTERN};
use trustgate_cache::{CachePolicy, CacheStore, Fence, MemoryCache, with_fenced_cache};
use trustgate_domain::{
    EvaluationContext, Evaluator, ExpressionModel, GraphEdge, GraphNode, PolicyDocument,
    PolicyStatus, compile_graph, lookup_failure,
};
use trustgate_settings::ResolvedConfig;
use trustgate_store::{NewPolicy, PolicyFilter, PolicyPage, PolicyPatch, PolicyStore, StoreError};
use trustgate_types::{Decision, Simulation, ids};

use crate::error::ServiceError;

pub struct PolicyService {
    store: Arc<dyn PolicyStore>,
    cache: Arc<dyn CacheStore>,
    evaluator: Evaluator,
    cache_policy: CachePolicy,
    fence: Fence,
}

impl PolicyService {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        cache: Arc<dyn CacheStore>,
        evaluator: Evaluator,
        cache_policy: CachePolicy,
    ) -> Self {
        Self {
            store,
            cache,
            evaluator,
            cache_policy,
            fence: Fence::new(),
        }
    }

    /// Service over `store` with an in-memory cache sized from the resolved config.
    pub fn from_config(store: Arc<dyn PolicyStore>, cfg: &ResolvedConfig) -> Self {
        let cache = Arc::new(MemoryCache::new(cfg.cache.max_entries));
        Self::new(
            store,
            cache,
            Evaluator::new(cfg.engine.clone()),
            cfg.cache.clone(),
        )
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate a stored policy. Never fails: every problem is a deny decision.
    pub fn evaluate(&self, policy_id: &str, ctx: &EvaluationContext) -> Decision {
        let span = tracing::debug_span!(
            "evaluate",
            policy_id,
            org = ctx.organization_id.as_deref().unwrap_or(keys::DEFAULT_ORG)
        );
        let _enter = span.enter();
        let started = Instant::now();

        let doc = match self.load_policy(policy_id, ctx.organization_id.as_deref()) {
            Ok(doc) => doc,
            Err(err) => {
                let reason = match &err {
                    StoreError::Unavailable(_) => {
                        tracing::warn!(error = %err, "policy storage unavailable; denying");
                        ids::REASON_STORAGE_UNAVAILABLE
                    }
                    _ => ids::REASON_POLICY_NOT_FOUND,
                };
                let mut decision = lookup_failure(reason, err.to_string());
                decision.processing_time_ms = elapsed_ms(started);
                tracing::debug!(reason, "lookup failed");
                return decision;
            }
        };

        // Unscoped reads are administrative; evaluation only sees documents in scope.
        if !doc.visible_to(ctx.organization_id.as_deref()) {
            tracing::debug!(owner = ?doc.organization_id, "policy outside evaluation scope");
            let mut decision = lookup_failure(
                ids::REASON_POLICY_NOT_FOUND,
                format!("policy '{}' is not visible to this organization", doc.id),
            );
            decision.processing_time_ms = elapsed_ms(started);
            return decision;
        }

        if doc.status == PolicyStatus::Archived {
            let mut decision = lookup_failure(
                ids::REASON_POLICY_NOT_FOUND,
                format!("policy '{}' is archived", doc.id),
            );
            decision.processing_time_ms = elapsed_ms(started);
            return decision;
        }

        let decision = self.decide(&doc, ctx);

        if let Err(err) = self.store.record_evaluation(&doc.id, &decision) {
            tracing::warn!(error = %err, "failed to record evaluation");
        }
        tracing::debug!(
            decision = decision.decision.as_str(),
            reason = %decision.reason,
            matched = ?decision.matched_expression_index,
            ms = decision.processing_time_ms,
            "evaluated"
        );
        decision
    }

    fn decide(&self, doc: &PolicyDocument, ctx: &EvaluationContext) -> Decision {
        if !self.cache_policy.cache_results {
            return self.evaluator.evaluate(doc, ctx);
        }
        let key = keys::evaluation_key(&doc.id, doc.version, &keys::query_hash(ctx));
        let ttl = self.cache_policy.result_ttl;
        match with_fenced_cache(self.cache.as_ref(), &self.fence, &key, ttl, || {
            Ok::<_, std::convert::Infallible>(self.evaluator.evaluate(doc, ctx))
        }) {
            Ok(cached) => cached.data,
            Err(never) => match never {},
        }
    }

    /// What-if evaluation of an unsaved document. Ignores `status`.
    pub fn simulate(
        &self,
        doc: &PolicyDocument,
        ctx: &EvaluationContext,
    ) -> Result<Simulation, ServiceError> {
        doc.validate(self.evaluator.config())?;
        Ok(Simulation {
            decision: self.evaluator.simulate(doc, ctx),
            simulation: true,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Compile a visual graph into ordered expressions.
    pub fn compile_graph(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> Result<Vec<ExpressionModel>, ServiceError> {
        Ok(compile_graph(nodes, edges, self.evaluator.config())?)
    }

    /// Fetch a document. `None` reads without organization scoping.
    pub fn get_policy(
        &self,
        policy_id: &str,
        organization_id: Option<&str>,
    ) -> Result<PolicyDocument, ServiceError> {
        Ok(self.load_policy(policy_id, organization_id)?)
    }

    pub fn search_policies(&self, filter: &PolicyFilter) -> Result<PolicyPage, ServiceError> {
        let key = keys::list_key(filter.organization_id.as_deref(), &keys::query_hash(filter));
        let ttl = self.cache_policy.list_ttl;
        let page = with_fenced_cache(self.cache.as_ref(), &self.fence, &key, ttl, || {
            self.store.search_policies(filter)
        })?;
        Ok(page.data)
    }

    /// Create a `draft` document after validating its expressions.
    pub fn create_policy(&self, policy: NewPolicy, created_by: &str) -> Result<String, ServiceError> {
        self.validate_expressions(&policy.expressions)?;
        let id = self.store.create_policy(policy, created_by)?;
        tracing::info!(policy_id = %id, actor = created_by, "policy created");
        self.invalidate(&id)?;
        Ok(id)
    }

    pub fn update_policy(
        &self,
        policy_id: &str,
        patch: PolicyPatch,
        updated_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, ServiceError> {
        if let Some(expressions) = &patch.expressions {
            self.validate_expressions(expressions)?;
        }
        let doc = self
            .store
            .update_policy(policy_id, patch, updated_by, reason)?;
        tracing::info!(
            policy_id,
            version = doc.version,
            actor = updated_by,
            "policy updated"
        );
        self.invalidate(policy_id)?;
        Ok(doc)
    }

    /// Move a document to `active`.
    pub fn publish_policy(
        &self,
        policy_id: &str,
        expected_version: u32,
        published_by: &str,
    ) -> Result<PolicyDocument, ServiceError> {
        let patch = PolicyPatch {
            expected_version,
            status: Some(PolicyStatus::Active),
            ..PolicyPatch::default()
        };
        self.update_policy(policy_id, patch, published_by, Some("publish"))
    }

    /// Soft delete: the document is archived and stops resolving for evaluation.
    pub fn delete_policy(
        &self,
        policy_id: &str,
        deleted_by: &str,
        reason: Option<&str>,
    ) -> Result<PolicyDocument, ServiceError> {
        let doc = self.store.delete_policy(policy_id, deleted_by, reason)?;
        tracing::info!(policy_id, actor = deleted_by, "policy archived");
        self.invalidate(policy_id)?;
        Ok(doc)
    }

    fn load_policy(
        &self,
        policy_id: &str,
        organization_id: Option<&str>,
    ) -> Result<PolicyDocument, StoreError> {
        let key = keys::policy_key(policy_id, organization_id);
        let ttl = self.cache_policy.policy_ttl;
        let loaded = with_fenced_cache(self.cache.as_ref(), &self.fence, &key, ttl, || {
            self.store.get_policy(policy_id, organization_id)
        })?;
        tracing::trace!(key = %key, hit = loaded.hit, "policy lookup");
        Ok(loaded.data)
    }

    fn validate_expressions(&self, expressions: &[ExpressionModel]) -> Result<(), ServiceError> {
        for (index, expr) in expressions.iter().enumerate() {
            expr.validate(self.evaluator.config())
                .map_err(|e| e.in_expression(index))?;
        }
        Ok(())
    }

    fn invalidate(&self, policy_id: &str) -> Result<(), ServiceError> {
        let removed = self.fence.invalidate(|| {
            let mut removed = 0;
            for pattern in [
                keys::policy_pattern(policy_id),
                keys::evaluation_pattern(policy_id),
                LIST_PATTERN.to_string(),
            ] {
                removed += self.cache.invalidate_pattern(&pattern).map_err(|err| {
                    tracing::error!(policy_id, pattern = %pattern, error = %err, "cache invalidation failed");
                    err
                })?;
            }
            Ok::<_, ServiceError>(removed)
        })?;
        tracing::debug!(policy_id, removed, "cache invalidated");
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
