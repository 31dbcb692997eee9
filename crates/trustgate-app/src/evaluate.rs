//! The `evaluate` and `simulate` use cases.

use std::sync::Arc;

use anyhow::Context;
use camino::Utf8Path;
use trustgate_domain::{EvaluationContext, PolicyDocument};
use trustgate_settings::ResolvedConfig;
use trustgate_store::MemoryStore;
use trustgate_types::{Decision, Effect, Simulation};

use crate::service::PolicyService;

/// Inputs for evaluating a stored policy.
#[derive(Clone, Debug)]
pub struct EvaluateInput<'a> {
    /// Directory of stored policy documents (`*.json`, searched recursively).
    pub policies_dir: &'a Utf8Path,
    pub policy_id: &'a str,
    /// JSON text of the evaluation context.
    pub context_text: &'a str,
    pub config: &'a ResolvedConfig,
}

/// Inputs for a what-if evaluation of an unsaved document.
#[derive(Clone, Debug)]
pub struct SimulateInput<'a> {
    pub policy_text: &'a str,
    pub context_text: &'a str,
    pub config: &'a ResolvedConfig,
}

/// Load the policy store and evaluate one policy.
///
/// Only I/O and parse failures are errors; a missing policy is a deny decision.
pub fn run_evaluate(input: EvaluateInput<'_>) -> anyhow::Result<Decision> {
    let ctx = parse_context(input.context_text)?;
    let store = MemoryStore::load_dir(input.policies_dir)
        .with_context(|| format!("load policies from {}", input.policies_dir))?;
    let service = PolicyService::from_config(Arc::new(store), input.config);
    Ok(service.evaluate(input.policy_id, &ctx))
}

pub fn run_simulate(input: SimulateInput<'_>) -> anyhow::Result<Simulation> {
    let doc: PolicyDocument =
        serde_json::from_str(input.policy_text).context("parse policy document")?;
    let ctx = parse_context(input.context_text)?;
    let service = PolicyService::from_config(Arc::new(MemoryStore::new()), input.config);
    service
        .simulate(&doc, &ctx)
        .with_context(|| format!("simulate policy '{}'", doc.id))
}

/// Process exit code for a decision: `0` allow, `2` deny, `3` throttle.
pub fn decision_exit_code(decision: &Decision) -> i32 {
    match decision.decision {
        Effect::Allow => 0,
        Effect::Deny => 2,
        Effect::Throttle => 3,
    }
}

fn parse_context(text: &str) -> anyhow::Result<EvaluationContext> {
    serde_json::from_str(text).context("parse evaluation context")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use trustgate_settings::Overrides;
    use trustgate_types::ids;

    fn config() -> ResolvedConfig {
        crate::load_config(None, Overrides::default()).expect("config")
    }

    fn gate_policy(status: &str) -> serde_json::Value {
        json!({
            "id": "gate",
            "name": "gate",
            "status": status,
            "expressions": [{
                "root": {
                    "type": "condition",
                    "field": "subject.trustLevel",
                    "operator": "greaterThanOrEqual",
                    "value": "VERIFIED"
                },
                "action": { "kind": "allow" }
            }]
        })
    }

    fn policies_dir(tmp: &tempfile::TempDir) -> Utf8PathBuf {
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path");
        std::fs::write(
            dir.join("gate.json"),
            serde_json::to_string(&gate_policy("active")).expect("json"),
        )
        .expect("write policy");
        dir
    }

    #[test]
    fn evaluate_from_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = policies_dir(&tmp);
        let cfg = config();

        let decision = run_evaluate(EvaluateInput {
            policies_dir: &dir,
            policy_id: "gate",
            context_text: r#"{ "subject": { "trustLevel": "TRUSTED" }, "action": "read" }"#,
            config: &cfg,
        })
        .expect("evaluate");
        assert!(decision.is_allowed());
        assert_eq!(decision_exit_code(&decision), 0);
    }

    #[test]
    fn unknown_policy_is_a_decision_not_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = policies_dir(&tmp);
        let cfg = config();

        let decision = run_evaluate(EvaluateInput {
            policies_dir: &dir,
            policy_id: "nope",
            context_text: "{}",
            config: &cfg,
        })
        .expect("evaluate");
        assert_eq!(decision.reason, ids::REASON_POLICY_NOT_FOUND);
        assert_eq!(decision_exit_code(&decision), 2);
    }

    #[test]
    fn bad_context_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = policies_dir(&tmp);
        let cfg = config();

        let err = run_evaluate(EvaluateInput {
            policies_dir: &dir,
            policy_id: "gate",
            context_text: "not json",
            config: &cfg,
        })
        .expect_err("bad context");
        assert!(format!("{err:#}").contains("parse evaluation context"));
    }

    #[test]
    fn simulate_runs_drafts() {
        let cfg = config();
        let policy = gate_policy("draft").to_string();
        let sim = run_simulate(SimulateInput {
            policy_text: &policy,
            context_text: r#"{ "subject": { "trustLevel": "VERIFIED" } }"#,
            config: &cfg,
        })
        .expect("simulate");
        assert!(sim.simulation);
        assert!(sim.decision.is_allowed());
    }

    #[test]
    fn simulate_rejects_malformed_documents() {
        let cfg = config();
        let policy = json!({
            "id": "broken",
            "expressions": [{
                "root": { "type": "logical", "kind": "OR", "children": [] },
                "action": { "kind": "allow" }
            }]
        })
        .to_string();
        let err = run_simulate(SimulateInput {
            policy_text: &policy,
            context_text: "{}",
            config: &cfg,
        })
        .expect_err("malformed");
        assert!(format!("{err:#}").contains("simulate policy 'broken'"));
    }

    #[test]
    fn exit_codes_follow_effect() {
        let mut decision = Decision::deny(ids::REASON_MATCHED);
        decision.decision = Effect::Throttle;
        assert_eq!(decision_exit_code(&decision), 3);
    }
}
